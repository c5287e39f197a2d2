//! Static reference data for the game.
//!
//! The catalog is built once at startup and passed by reference into every
//! validator. Adding an item type, enemy archetype, or skill is a single
//! table edit in [`GameCatalog::standard`].

use std::collections::BTreeMap;

use serde::Serialize;

/// Maximum level a skill can reach. No XP is tracked past this.
pub const MAX_SKILL_LEVEL: u32 = 10;

/// Inclusive `[min, max]` bound for a single numeric stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatRange {
    pub min: i64,
    pub max: i64,
}

impl StatRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Clamp a candidate value into this range.
    pub fn clamp(&self, value: i64) -> i64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-stat bounds for one item type.
#[derive(Debug, Clone, Serialize)]
pub struct ItemTypeDef {
    pub stat_ranges: BTreeMap<String, StatRange>,
}

impl ItemTypeDef {
    pub fn stat_range(&self, stat: &str) -> Option<StatRange> {
        self.stat_ranges.get(stat).copied()
    }
}

/// Heuristic stat ranges for one enemy archetype.
///
/// These are generation guidance serialized into the system prompt; the
/// combat validator does not enforce them.
#[derive(Debug, Clone, Serialize)]
pub struct EnemyArchetype {
    pub hp: StatRange,
    pub armor: StatRange,
    #[serde(rename = "minDmg")]
    pub min_dmg: StatRange,
    #[serde(rename = "maxDmg")]
    pub max_dmg: StatRange,
}

/// One entry of the skill catalog.
#[derive(Debug, Clone, Serialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Immutable reference tables consumed by the validators and prompt builder.
#[derive(Debug, Clone)]
pub struct GameCatalog {
    item_types: BTreeMap<String, ItemTypeDef>,
    enemy_archetypes: BTreeMap<String, EnemyArchetype>,
    skills: Vec<SkillDef>,
    xp_curve: BTreeMap<u32, u64>,
    max_skill_level: u32,
}

impl GameCatalog {
    pub fn new(
        item_types: BTreeMap<String, ItemTypeDef>,
        enemy_archetypes: BTreeMap<String, EnemyArchetype>,
        skills: Vec<SkillDef>,
        xp_curve: BTreeMap<u32, u64>,
        max_skill_level: u32,
    ) -> Self {
        Self {
            item_types,
            enemy_archetypes,
            skills,
            xp_curve,
            max_skill_level,
        }
    }

    pub fn item_type(&self, key: &str) -> Option<&ItemTypeDef> {
        self.item_types.get(key)
    }

    pub fn item_types(&self) -> &BTreeMap<String, ItemTypeDef> {
        &self.item_types
    }

    pub fn enemy_archetypes(&self) -> &BTreeMap<String, EnemyArchetype> {
        &self.enemy_archetypes
    }

    pub fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn skills(&self) -> &[SkillDef] {
        &self.skills
    }

    /// XP required to advance FROM `level` to `level + 1`.
    pub fn xp_to_advance(&self, level: u32) -> Option<u64> {
        self.xp_curve.get(&level).copied()
    }

    pub fn max_skill_level(&self) -> u32 {
        self.max_skill_level
    }

    /// The standard catalog shipped with the game.
    pub fn standard() -> Self {
        let item_types = BTreeMap::from([
            // Weapons - One-Handed
            item_type(
                "weapon_1h_sword",
                &[
                    ("minDmg", 1, 20),
                    ("maxDmg", 3, 25),
                    ("weight", 1000, 4000),
                    ("value", 10, 200),
                ],
            ),
            item_type(
                "weapon_1h_axe",
                &[
                    ("minDmg", 2, 22),
                    ("maxDmg", 4, 28),
                    ("weight", 1200, 4500),
                    ("value", 12, 220),
                ],
            ),
            item_type(
                "weapon_1h_mace",
                &[
                    ("minDmg", 3, 18),
                    ("maxDmg", 5, 24),
                    ("weight", 1500, 5000),
                    ("value", 15, 180),
                ],
            ),
            item_type(
                "weapon_dagger",
                &[
                    ("minDmg", 1, 8),
                    ("maxDmg", 2, 12),
                    ("weight", 200, 800),
                    ("value", 5, 80),
                ],
            ),
            // Weapons - Two-Handed
            item_type(
                "weapon_2h_sword",
                &[
                    ("minDmg", 8, 30),
                    ("maxDmg", 12, 40),
                    ("weight", 3000, 8000),
                    ("value", 50, 500),
                ],
            ),
            item_type(
                "weapon_2h_axe",
                &[
                    ("minDmg", 10, 35),
                    ("maxDmg", 15, 45),
                    ("weight", 3500, 9000),
                    ("value", 60, 550),
                ],
            ),
            item_type(
                "weapon_spear",
                &[
                    ("minDmg", 6, 25),
                    ("maxDmg", 10, 35),
                    ("weight", 2000, 5000),
                    ("value", 30, 300),
                ],
            ),
            // Ranged Weapons
            item_type(
                "weapon_bow",
                &[
                    ("minDmg", 4, 18),
                    ("maxDmg", 8, 28),
                    ("weight", 800, 2000),
                    ("value", 20, 250),
                ],
            ),
            item_type(
                "weapon_crossbow",
                &[
                    ("minDmg", 8, 25),
                    ("maxDmg", 12, 35),
                    ("weight", 2000, 4000),
                    ("value", 40, 400),
                ],
            ),
            // Armor
            item_type(
                "armor_helmet",
                &[("armor", 1, 8), ("weight", 1000, 3000), ("value", 15, 150)],
            ),
            item_type(
                "armor_chest",
                &[("armor", 2, 15), ("weight", 3000, 12000), ("value", 30, 400)],
            ),
            item_type(
                "armor_legs",
                &[("armor", 1, 10), ("weight", 2000, 8000), ("value", 20, 250)],
            ),
            item_type(
                "armor_boots",
                &[("armor", 1, 5), ("weight", 500, 2000), ("value", 10, 100)],
            ),
            item_type(
                "armor_gloves",
                &[("armor", 1, 4), ("weight", 300, 1500), ("value", 8, 80)],
            ),
            item_type(
                "armor_shield",
                &[("armor", 2, 12), ("weight", 2000, 6000), ("value", 25, 300)],
            ),
            // Consumables
            item_type(
                "consumable_potion_health",
                &[
                    ("healing", 10, 100),
                    ("weight", 100, 300),
                    ("value", 5, 80),
                ],
            ),
            item_type(
                "consumable_food",
                &[("healing", 5, 30), ("weight", 100, 500), ("value", 1, 20)],
            ),
            // Miscellaneous
            item_type("misc_material", &[("weight", 50, 2000), ("value", 1, 100)]),
            item_type("misc_jewel", &[("weight", 10, 100), ("value", 50, 1000)]),
            item_type("misc_key", &[("weight", 10, 50), ("value", 0, 10)]),
            item_type("misc_document", &[("weight", 10, 100), ("value", 0, 50)]),
        ]);

        let enemy_archetypes = BTreeMap::from([
            // Common enemies
            archetype("bandit", (30, 50), (1, 3), (3, 7), (5, 10)),
            archetype("bandit_elite", (50, 80), (3, 5), (5, 10), (8, 15)),
            // Animals
            archetype("wolf", (20, 35), (0, 1), (4, 8), (6, 12)),
            archetype("bear", (60, 100), (2, 4), (8, 15), (12, 20)),
            archetype("boar", (30, 50), (1, 3), (5, 10), (8, 14)),
            // Monsters
            archetype("goblin", (15, 30), (0, 2), (2, 5), (4, 8)),
            archetype("orc", (50, 80), (3, 6), (6, 12), (10, 18)),
            archetype("troll", (100, 150), (5, 10), (12, 20), (18, 30)),
            // Undead
            archetype("skeleton", (20, 40), (2, 4), (4, 8), (6, 12)),
            archetype("zombie", (30, 50), (1, 3), (5, 10), (8, 14)),
            // Boss-tier
            archetype("dragon", (200, 400), (10, 20), (20, 40), (30, 60)),
            archetype("demon", (150, 300), (8, 15), (15, 30), (25, 45)),
        ]);

        let skills = vec![
            // Combat Skills - Melee
            skill(
                "1h_sword",
                "One-Handed Swords",
                "Proficiency with single-handed bladed weapons",
            ),
            skill(
                "2h_sword",
                "Two-Handed Swords",
                "Proficiency with large two-handed blades",
            ),
            skill(
                "1h_axe",
                "One-Handed Axes",
                "Proficiency with single-handed axes",
            ),
            skill(
                "2h_axe",
                "Two-Handed Axes",
                "Proficiency with large two-handed axes",
            ),
            skill(
                "blunt",
                "Blunt Weapons",
                "Proficiency with maces, clubs, and hammers",
            ),
            skill(
                "dagger",
                "Daggers",
                "Proficiency with short blades and knives",
            ),
            skill(
                "spear",
                "Spears & Polearms",
                "Proficiency with spears and pole weapons",
            ),
            // Combat Skills - Ranged
            skill("archery", "Archery", "Proficiency with bows"),
            skill("crossbow", "Crossbows", "Proficiency with crossbows"),
            skill(
                "throwing",
                "Throwing Weapons",
                "Proficiency with thrown weapons",
            ),
            // Combat Skills - Defense
            skill(
                "shield",
                "Shield Combat",
                "Proficiency with shields in combat",
            ),
            skill("dodge", "Dodge", "Ability to evade attacks"),
            skill("parry", "Parry", "Ability to deflect attacks with weapon"),
            // Social Skills
            skill(
                "diplomacy",
                "Diplomacy",
                "Art of negotiation and persuasion",
            ),
            skill(
                "intimidation",
                "Intimidation",
                "Ability to frighten and coerce",
            ),
            skill(
                "deception",
                "Deception",
                "Skill in lying and manipulation",
            ),
            skill("barter", "Barter", "Skill in trading and haggling"),
            // Utility Skills
            skill("stealth", "Stealth", "Ability to move unseen and unheard"),
            skill(
                "lockpicking",
                "Lockpicking",
                "Ability to pick locks and bypass mechanisms",
            ),
            skill(
                "pickpocket",
                "Pickpocket",
                "Ability to steal from others unnoticed",
            ),
            skill(
                "tracking",
                "Tracking",
                "Ability to follow trails and find prey",
            ),
            skill(
                "survival",
                "Survival",
                "Knowledge of wilderness survival",
            ),
            skill(
                "medicine",
                "Medicine",
                "Knowledge of healing and treating wounds",
            ),
            // Knowledge Skills
            skill(
                "lore_history",
                "Historical Lore",
                "Knowledge of history and legends",
            ),
            skill(
                "lore_arcane",
                "Arcane Lore",
                "Knowledge of magic and mystical matters",
            ),
            skill(
                "lore_nature",
                "Nature Lore",
                "Knowledge of flora, fauna, and natural phenomena",
            ),
        ];

        // XP needed to advance from each level to the next.
        let xp_curve = BTreeMap::from([
            (1, 10),
            (2, 20),
            (3, 40),
            (4, 80),
            (5, 160),
            (6, 320),
            (7, 640),
            (8, 1280),
            (9, 2560),
            (10, 5120),
        ]);

        Self::new(
            item_types,
            enemy_archetypes,
            skills,
            xp_curve,
            MAX_SKILL_LEVEL,
        )
    }
}

fn item_type(key: &str, ranges: &[(&str, i64, i64)]) -> (String, ItemTypeDef) {
    let stat_ranges = ranges
        .iter()
        .map(|(stat, min, max)| (stat.to_string(), StatRange::new(*min, *max)))
        .collect();
    (key.to_string(), ItemTypeDef { stat_ranges })
}

fn archetype(
    key: &str,
    hp: (i64, i64),
    armor: (i64, i64),
    min_dmg: (i64, i64),
    max_dmg: (i64, i64),
) -> (String, EnemyArchetype) {
    (
        key.to_string(),
        EnemyArchetype {
            hp: StatRange::new(hp.0, hp.1),
            armor: StatRange::new(armor.0, armor.1),
            min_dmg: StatRange::new(min_dmg.0, min_dmg.1),
            max_dmg: StatRange::new(max_dmg.0, max_dmg.1),
        },
    )
}

fn skill(id: &str, name: &str, description: &str) -> SkillDef {
    SkillDef {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_item_ranges() {
        let catalog = GameCatalog::standard();
        let sword = catalog.item_type("weapon_1h_sword").expect("known type");
        assert_eq!(sword.stat_range("minDmg"), Some(StatRange::new(1, 20)));
        assert_eq!(sword.stat_range("value"), Some(StatRange::new(10, 200)));
        assert_eq!(sword.stat_range("healing"), None);
        assert!(catalog.item_type("weapon_banana").is_none());
    }

    #[test]
    fn test_standard_catalog_counts() {
        let catalog = GameCatalog::standard();
        assert_eq!(catalog.item_types().len(), 21);
        assert_eq!(catalog.enemy_archetypes().len(), 12);
        assert_eq!(catalog.skills().len(), 26);
    }

    #[test]
    fn test_xp_curve_doubles() {
        let catalog = GameCatalog::standard();
        assert_eq!(catalog.xp_to_advance(1), Some(10));
        assert_eq!(catalog.xp_to_advance(9), Some(2560));
        assert_eq!(catalog.xp_to_advance(11), None);
        assert_eq!(catalog.max_skill_level(), 10);
    }

    #[test]
    fn test_stat_range_clamp() {
        let range = StatRange::new(3, 7);
        assert_eq!(range.clamp(1), 3);
        assert_eq!(range.clamp(5), 5);
        assert_eq!(range.clamp(12), 7);
        assert!(range.contains(3));
        assert!(!range.contains(8));
    }
}
