//! Starter loadout and opening scene for a freshly created character.

use std::collections::BTreeMap;

use crate::entities::NewItem;
use crate::value_objects::{Currency, StatBlock};

/// Stats every new character starts with.
pub fn initial_stats() -> StatBlock {
    StatBlock::new(100, Some(100))
}

/// Coins every new character starts with.
pub fn starter_currency() -> Currency {
    Currency::new(0, 4, 5)
}

/// A skill granted at character creation.
#[derive(Debug, Clone)]
pub struct StarterSkill {
    pub skill_key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn starter_items() -> Vec<NewItem> {
    vec![
        NewItem {
            item_type: "weapon_1h_sword".to_string(),
            name: "Rusty One-Handed Sword".to_string(),
            description: "A worn blade, its edge dulled by years of use. Better than nothing."
                .to_string(),
            stats: stats(&[("minDmg", 3), ("maxDmg", 6), ("weight", 2500), ("value", 15)]),
            quantity: 1,
            equipped: true,
        },
        NewItem {
            item_type: "armor_chest".to_string(),
            name: "Torn Leather Vest".to_string(),
            description:
                "Cracked leather armor that has seen better days. Offers minimal protection."
                    .to_string(),
            stats: stats(&[("armor", 2), ("weight", 3000), ("value", 20)]),
            quantity: 1,
            equipped: true,
        },
        NewItem {
            item_type: "consumable_food".to_string(),
            name: "Stale Bread".to_string(),
            description: "Hard, dry bread. It will keep you alive, barely.".to_string(),
            stats: stats(&[("healing", 10), ("weight", 200), ("value", 2)]),
            quantity: 4,
            equipped: false,
        },
    ]
}

pub fn starter_skills() -> Vec<StarterSkill> {
    vec![
        StarterSkill {
            skill_key: "1h_sword",
            name: "One-Handed Swords",
            description: "Proficiency with single-handed bladed weapons",
        },
        StarterSkill {
            skill_key: "1h_axe",
            name: "One-Handed Axes",
            description: "Proficiency with single-handed axes",
        },
        StarterSkill {
            skill_key: "dodge",
            name: "Dodge",
            description: "Ability to evade attacks",
        },
        StarterSkill {
            skill_key: "parry",
            name: "Parry",
            description: "Ability to deflect attacks with weapon",
        },
        StarterSkill {
            skill_key: "diplomacy",
            name: "Diplomacy",
            description: "Art of negotiation and persuasion",
        },
        StarterSkill {
            skill_key: "barter",
            name: "Barter",
            description: "Skill in trading and haggling",
        },
        StarterSkill {
            skill_key: "survival",
            name: "Survival",
            description: "Knowledge of wilderness survival",
        },
    ]
}

/// The fixed opening-scene prompt sent for a character's first turn.
pub fn initial_story_prompt(character_name: &str, gender: &str) -> String {
    let (pronoun, possessive) = match gender {
        "male" => ("He", "his"),
        "female" => ("She", "her"),
        _ => ("They", "their"),
    };

    format!(
        "The player character {character_name} is a wandering sellsword. {pronoun} has just \
         arrived at a war-torn village at dusk after days of travel. Smoke rises from burned \
         buildings in the distance. The village seems mostly intact but shows clear signs of \
         recent conflict. {pronoun} stands at the village entrance, weighing {possessive} \
         options. Begin the story here."
    )
}

fn stats(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}
