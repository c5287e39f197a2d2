//! Turn payload types - what the game-master model returns each turn.
//!
//! The response is an explicit optional-field record: `story_text` and
//! `choices` are required, every state-delta group is optional. Unknown
//! fields are ignored so prompt additions don't break older servers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DomainError;

/// One structured response from the game master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryResponse {
    pub story_text: String,
    pub choices: Vec<Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_changes: Option<StatsChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_changes: Option<Vec<InventoryChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_changes: Option<CurrencyChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_used: Option<Vec<SkillUsage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enemies: Option<Vec<Enemy>>,
    /// Advisory combat math from the model; carried through, never validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combat_calculations: Option<serde_json::Value>,
}

impl StoryResponse {
    /// Strict parse of raw model text. Any JSON error, including a missing
    /// `story_text` or `choices`, rejects the whole turn.
    pub fn from_json_str(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw).map_err(|e| DomainError::parse(e.to_string()))
    }

    /// Active-combat roster check: present AND non-empty.
    pub fn has_active_enemies(&self) -> bool {
        self.enemies.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// A player choice offered by the narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// Proposed character stat deltas. Only hit points participate today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
}

/// One proposed inventory delta. Positive quantity gains an item,
/// negative consumes from an existing stack of the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryChange {
    #[serde(rename = "type")]
    pub item_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub quantity: i64,
}

/// Proposed coin deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silver: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copper: Option<i64>,
}

/// A skill the character exercised this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillUsage {
    #[serde(rename = "skillId")]
    pub skill_key: String,
    pub usage_count: i64,
}

/// An enemy in the active combat roster. Ephemeral - lives only inside
/// turn responses, never persisted as its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub hp: i64,
    #[serde(rename = "maxHp")]
    pub max_hp: i64,
    pub armor: i64,
    #[serde(rename = "minDmg")]
    pub min_dmg: i64,
    #[serde(rename = "maxDmg")]
    pub max_dmg: i64,
}

/// One entry of a story's append-only progress log: the sanitized response
/// plus the input the player answered it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    #[serde(flatten)]
    pub response: StoryResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
}

impl ProgressEntry {
    pub fn new(response: StoryResponse) -> Self {
        Self {
            response,
            user_input: None,
        }
    }

    pub fn with_input(response: StoryResponse, user_input: impl Into<String>) -> Self {
        Self {
            response,
            user_input: Some(user_input.into()),
        }
    }
}
