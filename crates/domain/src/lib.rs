//! Taleforge domain - the rules of the game.
//!
//! Everything here is pure: reference data ([`catalog`]), soft validators
//! ([`validation`]), skill progression ([`progression`]), and the
//! reconciliation pass ([`reconcile`]) that folds a game-master response
//! into character state. Persistence and the LLM boundary live in the
//! engine crate.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod ids;
pub mod loadout;
pub mod progression;
pub mod reconcile;
pub mod turn;
pub mod validation;
pub mod value_objects;

pub use entities::{Character, CharacterItem, CharacterSkill, NewItem, Story};

pub use error::DomainError;

pub use catalog::{EnemyArchetype, GameCatalog, ItemTypeDef, SkillDef, StatRange, MAX_SKILL_LEVEL};

pub use ids::{CharacterId, ItemId, SkillId, StoryId, UserId};

pub use progression::{apply_usage, SkillProgress, XP_PER_USE};

pub use reconcile::{reconcile, CharacterSnapshot, InventoryPolicy, Mutation, Reconciliation};

pub use turn::{
    Choice, CurrencyChanges, Enemy, InventoryChange, ProgressEntry, SkillUsage, StatsChanges,
    StoryResponse,
};

pub use validation::{
    validate_currency, validate_enemies, validate_item, validate_stats, EnemyValidation,
};

pub use value_objects::{Currency, StatBlock};
