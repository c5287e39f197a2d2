//! Story entity - one playthrough bound to a character.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, StoryId, UserId};
use crate::turn::{ProgressEntry, StoryResponse};

/// A story in progress.
///
/// `progress` is the append-only turn log; `last_response` is the sanitized
/// response the player is currently answering. The playable state is always
/// `last_response` combined with the latest character/item/skill records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub user_id: UserId,
    pub character_id: CharacterId,
    pub name: String,
    pub last_response: StoryResponse,
    pub progress: Vec<ProgressEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    pub fn new(
        user_id: UserId,
        character_id: CharacterId,
        name: impl Into<String>,
        first_response: StoryResponse,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: StoryId::new(),
            user_id,
            character_id,
            name: name.into(),
            progress: vec![ProgressEntry::new(first_response.clone())],
            last_response: first_response,
            created_at: now,
            updated_at: now,
        }
    }
}
