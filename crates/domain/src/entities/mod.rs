mod character;
mod item;
mod skill;
mod story;

pub use character::Character;
pub use item::{CharacterItem, NewItem};
pub use skill::CharacterSkill;
pub use story::Story;
