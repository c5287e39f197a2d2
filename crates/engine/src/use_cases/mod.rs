//! Use cases - user story orchestration over the ports.

pub mod characters;
pub mod turn;

pub use characters::{CharacterError, CharacterLoadout, CharacterOps};
pub use turn::{
    ContinueStory, ContinueStoryStream, StartStory, StartedStory, StoryStream, TurnError,
};
