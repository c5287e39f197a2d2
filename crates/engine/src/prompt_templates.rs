//! Game-master system prompt assembly.
//!
//! The prompt is four sections joined with dividers: the narrative voice,
//! catalog excerpts (item types, skills, enemy archetypes) so the model
//! proposes values the validators will accept, and the strict output format.

use taleforge_domain::GameCatalog;

const BASE_PROMPT: &str = r#"You are the game master of a dark medieval fantasy RPG inspired by war-torn medieval Europe.

WORLD SETTING:
- Fragmented kingdoms locked in constant warfare
- Petty lords, dukes, and barons scheme for power
- Villages burn, famine spreads, plague lurks
- Bandits and deserters plague the roads
- Monsters haunt deep forests and cursed swamps
- The player is a wandering sellsword, taking contracts to survive

YOUR ROLE:
1. Continue the story based on player actions
2. Create immersive, atmospheric narrative
3. Narrate consequences realistically (actions have weight)
4. Update stats logically (combat hurts, rest heals)
5. Provide meaningful choices (not obvious good/bad)

WRITING STYLE:
- Show, don't tell; lean on sensory detail
- Dark and grounded; violence is brutal and consequential
- Death is common and permanent; morality is gray
- Hope exists but is fragile"#;

const OUTPUT_FORMAT_PROMPT: &str = r#"STRICT OUTPUT FORMAT:

You MUST respond with ONLY valid JSON. No text before or after.

{
  "story_text": "string",
  "choices": [
    {"id": "choice_1", "text": "Strike with your longsword"},
    {"id": "choice_2", "text": "Dodge and look for an opening"}
  ],
  "stats_changes": {"hp": -5},
  "inventory_changes": [
    {
      "type": "weapon_1h_sword",
      "name": "Rusty Longsword",
      "stats": {"minDmg": 4, "maxDmg": 7, "weight": 2800, "value": 35},
      "quantity": 1
    }
  ],
  "currency_changes": {"gold": 0, "silver": 2, "copper": 15},
  "skills_used": [
    {"skillId": "1h_sword", "usage_count": 2}
  ],
  "enemies": [
    {"name": "Bandit", "hp": 35, "maxHp": 50, "armor": 2, "minDmg": 5, "maxDmg": 10}
  ],
  "combat_calculations": []
}

REQUIRED FIELDS:
- story_text: Always present
- choices: Always present (2-8 choices)
- stats_changes: Only if stats changed
- inventory_changes: Only if items gained/lost (negative quantity consumes)
- currency_changes: Only if money changed
- skills_used: Only if skills were used
- enemies: Array of enemies while the player is in combat; empty array once combat ends
- combat_calculations: Array of calculations if in active combat"#;

/// The full system prompt for the given catalog.
pub fn build_system_prompt(catalog: &GameCatalog) -> String {
    [
        BASE_PROMPT.to_string(),
        item_types_section(catalog),
        skills_section(catalog),
        combat_section(catalog),
        OUTPUT_FORMAT_PROMPT.to_string(),
    ]
    .join("\n\n---\n\n")
}

fn item_types_section(catalog: &GameCatalog) -> String {
    format!(
        "ITEM TYPES:\n\nWhen generating items, use one of these `type` keys and keep every \
         stat inside its {{min, max}} range. Out-of-range values are corrected. An item that \
         fits no type may use a unique type key.\n\n{}",
        json_block(catalog.item_types())
    )
}

fn skills_section(catalog: &GameCatalog) -> String {
    format!(
        "SKILLS:\n\nReport usage only for skills the character actually has, by `id`:\n\n{}",
        json_block(&catalog.skills())
    )
}

fn combat_section(catalog: &GameCatalog) -> String {
    format!(
        "ENEMY ARCHETYPES:\n\nHeuristic stat ranges for generating enemies. Scale within these \
         bounds by the enemy's experience and equipment; named uniques may deviate \
         moderately.\n\n{}",
        json_block(catalog.enemy_archetypes())
    )
}

fn json_block<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize prompt section");
        String::from("{}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_carries_catalog_data() {
        let catalog = GameCatalog::standard();
        let prompt = build_system_prompt(&catalog);

        assert!(prompt.contains("weapon_1h_sword"));
        assert!(prompt.contains("lore_arcane"));
        assert!(prompt.contains("bandit_elite"));
        assert!(prompt.contains("STRICT OUTPUT FORMAT"));
    }

    #[test]
    fn test_sections_are_divided() {
        let catalog = GameCatalog::standard();
        let prompt = build_system_prompt(&catalog);
        assert_eq!(prompt.matches("\n\n---\n\n").count(), 4);
    }
}
