//! Character entity - the player-owned protagonist of a story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CharacterId, UserId};
use crate::value_objects::{Currency, StatBlock};

/// A player character with its authoritative stats and coin balances.
///
/// Items and skills live in their own collections keyed by `id`; stories
/// reference the character they play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    pub gender: String,
    pub stats: StatBlock,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        gender: impl Into<String>,
        stats: StatBlock,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CharacterId::new(),
            user_id,
            name: name.into(),
            gender: gender.into(),
            stats,
            currency,
            created_at: now,
            updated_at: now,
        }
    }

    /// Character names must be 3..=39 characters after trimming.
    pub fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Character name is required"));
        }
        if trimmed.len() <= 2 || trimmed.len() >= 40 {
            return Err(DomainError::validation(
                "Character name must be between 2 and 40 characters",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_bounds() {
        assert!(Character::validate_name("Ash").is_ok());
        assert!(Character::validate_name("").is_err());
        assert!(Character::validate_name("  ").is_err());
        assert!(Character::validate_name("Ab").is_err());
        assert!(Character::validate_name(&"x".repeat(40)).is_err());
        assert!(Character::validate_name(&"x".repeat(39)).is_ok());
    }
}
