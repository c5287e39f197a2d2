//! Character management - creation with starter loadout, listing, deletion.

use std::sync::Arc;

use taleforge_domain::{
    loadout, Character, CharacterId, CharacterItem, CharacterSkill, DomainError, UserId,
};

use crate::infrastructure::ports::{CharacterRepo, ClockPort, ItemRepo, RepoError, SkillRepo};

pub struct CharacterOps {
    characters: Arc<dyn CharacterRepo>,
    items: Arc<dyn ItemRepo>,
    skills: Arc<dyn SkillRepo>,
    clock: Arc<dyn ClockPort>,
}

/// A freshly created character with its starter records.
pub struct CharacterLoadout {
    pub character: Character,
    pub items: Vec<CharacterItem>,
    pub skills: Vec<CharacterSkill>,
}

impl CharacterOps {
    pub fn new(
        characters: Arc<dyn CharacterRepo>,
        items: Arc<dyn ItemRepo>,
        skills: Arc<dyn SkillRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            characters,
            items,
            skills,
            clock,
        }
    }

    /// Create a character with initial stats, starter items, starter skills,
    /// and pocket change.
    pub async fn create_with_loadout(
        &self,
        user_id: UserId,
        name: &str,
        gender: &str,
    ) -> Result<CharacterLoadout, CharacterError> {
        Character::validate_name(name)?;

        let character = Character::new(
            user_id,
            name.trim(),
            gender,
            loadout::initial_stats(),
            loadout::starter_currency(),
            self.clock.now(),
        );
        self.characters.create(&character).await?;

        let mut items = Vec::new();
        for new_item in loadout::starter_items() {
            let item = CharacterItem::from_new(character.id, new_item);
            self.items.create(&item).await?;
            items.push(item);
        }

        let mut skills = Vec::new();
        for starter in loadout::starter_skills() {
            let skill = CharacterSkill::new(
                character.id,
                starter.skill_key,
                starter.name,
                starter.description,
                1,
                0,
            );
            self.skills.create(&skill).await?;
            skills.push(skill);
        }

        tracing::info!(character_id = %character.id, name = %character.name, "Created character with starter loadout");
        Ok(CharacterLoadout {
            character,
            items,
            skills,
        })
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Character>, CharacterError> {
        Ok(self.characters.list(user_id).await?)
    }

    pub async fn get(
        &self,
        id: CharacterId,
        user_id: UserId,
    ) -> Result<Character, CharacterError> {
        self.characters
            .get(id, user_id)
            .await?
            .ok_or(CharacterError::NotFound)
    }

    /// Delete a character and everything it owns.
    pub async fn delete(&self, id: CharacterId, user_id: UserId) -> Result<(), CharacterError> {
        if self.characters.delete(id, user_id).await? {
            Ok(())
        } else {
            Err(CharacterError::NotFound)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CharacterError {
    #[error("Character not found")]
    NotFound,
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
