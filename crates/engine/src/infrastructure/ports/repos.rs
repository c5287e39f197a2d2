//! Repository port traits - record-oriented CRUD keyed by owner.
//!
//! Every read that backs a player-facing operation takes the acting user's
//! id; ownership checks double as existence checks, so "not yours" and
//! "does not exist" are indistinguishable to callers.

use async_trait::async_trait;

use taleforge_domain::{
    Character, CharacterId, CharacterItem, CharacterSkill, Mutation, ProgressEntry, Story, StoryId,
    StoryResponse, UserId,
};

use super::error::RepoError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    async fn create(&self, character: &Character) -> Result<(), RepoError>;
    async fn get(&self, id: CharacterId, user_id: UserId) -> Result<Option<Character>, RepoError>;
    async fn list(&self, user_id: UserId) -> Result<Vec<Character>, RepoError>;
    /// Delete a character and everything it owns (items, skills, stories).
    /// Returns false when no owned character matched.
    async fn delete(&self, id: CharacterId, user_id: UserId) -> Result<bool, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepo: Send + Sync {
    async fn create(&self, item: &CharacterItem) -> Result<(), RepoError>;
    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CharacterItem>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillRepo: Send + Sync {
    async fn create(&self, skill: &CharacterSkill) -> Result<(), RepoError>;
    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CharacterSkill>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoryRepo: Send + Sync {
    async fn create(&self, story: &Story) -> Result<(), RepoError>;
    async fn get(&self, id: StoryId, user_id: UserId) -> Result<Option<Story>, RepoError>;
    /// Cheap read of only the last sanitized response, for the game UI.
    async fn get_last_response(
        &self,
        id: StoryId,
        user_id: UserId,
    ) -> Result<Option<StoryResponse>, RepoError>;
}

/// Everything one completed turn writes, applied atomically.
#[derive(Debug, Clone)]
pub struct TurnWrite {
    pub story_id: StoryId,
    pub character_id: CharacterId,
    pub mutations: Vec<Mutation>,
    /// The story's full progress log after this turn.
    pub progress: Vec<ProgressEntry>,
    pub last_response: StoryResponse,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TurnWriter: Send + Sync {
    /// Apply a turn's mutation set and progress append in one transaction.
    /// A mid-turn crash must not leave the character partially updated.
    async fn apply_turn(&self, write: TurnWrite) -> Result<(), RepoError>;
}
