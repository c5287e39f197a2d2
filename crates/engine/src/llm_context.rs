//! Context snapshot sent to the game master each turn.
//!
//! The model sees the character sheet, inventory, skills, the active combat
//! roster when one exists, and a short tail of the progress log. Field names
//! are part of the prompt contract; the system prompt documents them.

use serde::Serialize;

use taleforge_domain::{
    Character, CharacterItem, CharacterSkill, Currency, Enemy, ProgressEntry, StatBlock,
};

/// How many trailing progress entries ride along as context.
pub const RECENT_HISTORY_LEN: usize = 3;

#[derive(Debug, Serialize)]
pub struct TurnContext {
    character: CharacterContext,
    inventory: Vec<InventoryEntry>,
    skills: Vec<SkillEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    combat: Option<CombatContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recent_history: Option<Vec<ProgressEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    initial_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
struct CharacterContext {
    name: String,
    gender: String,
    current_stats: StatBlock,
    currency: Currency,
}

#[derive(Debug, Serialize)]
struct InventoryEntry {
    #[serde(rename = "type")]
    item_type: String,
    name: String,
    stats: std::collections::BTreeMap<String, i64>,
    quantity: u32,
    equipped: bool,
}

#[derive(Debug, Serialize)]
struct SkillEntry {
    #[serde(rename = "skillId")]
    skill_key: String,
    name: String,
    level: u32,
}

#[derive(Debug, Serialize)]
struct CombatContext {
    active: bool,
    enemies: Vec<Enemy>,
}

impl TurnContext {
    /// Context for a character's very first turn.
    pub fn initial(
        character: &Character,
        items: &[CharacterItem],
        skills: &[CharacterSkill],
        initial_prompt: String,
    ) -> Self {
        Self {
            character: character_context(character),
            inventory: inventory_entries(items),
            skills: skill_entries(skills),
            combat: None,
            recent_history: None,
            current_action: None,
            initial_prompt: Some(initial_prompt),
        }
    }

    /// Context for a continuation turn. `history` is the full progress log
    /// including the entry for the input being answered; only the last
    /// [`RECENT_HISTORY_LEN`] entries are sent.
    pub fn next_turn(
        character: &Character,
        items: &[CharacterItem],
        skills: &[CharacterSkill],
        active_enemies: Option<&[Enemy]>,
        history: &[ProgressEntry],
        current_action: &str,
    ) -> Self {
        let combat = active_enemies
            .filter(|enemies| !enemies.is_empty())
            .map(|enemies| CombatContext {
                active: true,
                enemies: enemies.to_vec(),
            });

        let tail_start = history.len().saturating_sub(RECENT_HISTORY_LEN);

        Self {
            character: character_context(character),
            inventory: inventory_entries(items),
            skills: skill_entries(skills),
            combat,
            recent_history: Some(history[tail_start..].to_vec()),
            current_action: Some(current_action.to_string()),
            initial_prompt: None,
        }
    }

    /// The JSON user message handed to the LLM.
    pub fn to_user_message(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize turn context");
            String::from("{}")
        })
    }
}

fn character_context(character: &Character) -> CharacterContext {
    CharacterContext {
        name: character.name.clone(),
        gender: character.gender.clone(),
        current_stats: character.stats.clone(),
        currency: character.currency,
    }
}

fn inventory_entries(items: &[CharacterItem]) -> Vec<InventoryEntry> {
    items
        .iter()
        .map(|item| InventoryEntry {
            item_type: item.item_type.clone(),
            name: item.name.clone(),
            stats: item.stats.clone(),
            quantity: item.quantity,
            equipped: item.equipped,
        })
        .collect()
}

fn skill_entries(skills: &[CharacterSkill]) -> Vec<SkillEntry> {
    skills
        .iter()
        .map(|skill| SkillEntry {
            skill_key: skill.skill_key.clone(),
            name: skill.name.clone(),
            level: skill.level,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taleforge_domain::{loadout, StoryResponse, UserId};

    fn character() -> Character {
        Character::new(
            UserId::new(),
            "Kara",
            "female",
            loadout::initial_stats(),
            loadout::starter_currency(),
            Utc::now(),
        )
    }

    fn entry(text: &str) -> ProgressEntry {
        ProgressEntry::new(
            StoryResponse::from_json_str(&format!(
                r#"{{"story_text": "{text}", "choices": []}}"#
            ))
            .expect("valid"),
        )
    }

    #[test]
    fn test_initial_context_shape() {
        let character = character();
        let context = TurnContext::initial(&character, &[], &[], "Begin here.".to_string());
        let json: serde_json::Value =
            serde_json::from_str(&context.to_user_message()).expect("valid json");

        assert_eq!(json["character"]["name"], "Kara");
        assert_eq!(json["character"]["current_stats"]["hp"], 100);
        assert_eq!(json["character"]["currency"]["silver"], 4);
        assert_eq!(json["initial_prompt"], "Begin here.");
        assert!(json.get("combat").is_none());
        assert!(json.get("recent_history").is_none());
    }

    #[test]
    fn test_next_turn_truncates_history() {
        let character = character();
        let history: Vec<ProgressEntry> =
            (0..5).map(|i| entry(&format!("Turn {i}"))).collect();

        let context =
            TurnContext::next_turn(&character, &[], &[], None, &history, "Press on");
        let json: serde_json::Value =
            serde_json::from_str(&context.to_user_message()).expect("valid json");

        let recent = json["recent_history"].as_array().expect("history array");
        assert_eq!(recent.len(), RECENT_HISTORY_LEN);
        assert_eq!(recent[0]["story_text"], "Turn 2");
        assert_eq!(json["current_action"], "Press on");
    }

    #[test]
    fn test_next_turn_includes_combat_block() {
        let character = character();
        let enemies = vec![Enemy {
            name: "Wolf".to_string(),
            hp: 20,
            max_hp: 20,
            armor: 0,
            min_dmg: 4,
            max_dmg: 8,
        }];

        let context = TurnContext::next_turn(
            &character,
            &[],
            &[],
            Some(&enemies),
            &[entry("A wolf appears")],
            "Fight",
        );
        let json: serde_json::Value =
            serde_json::from_str(&context.to_user_message()).expect("valid json");

        assert_eq!(json["combat"]["active"], true);
        assert_eq!(json["combat"]["enemies"][0]["name"], "Wolf");
        assert_eq!(json["combat"]["enemies"][0]["maxHp"], 20);
    }
}
