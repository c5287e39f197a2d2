//! Soft validators for model-proposed game state.
//!
//! The game master is untrusted: values out of range are corrected in place,
//! never rejected. Corrections come back as warning strings for the caller
//! to log. Only a structurally malformed payload (see
//! [`crate::turn::StoryResponse::from_json_str`]) aborts a turn.

use crate::catalog::GameCatalog;
use crate::turn::{CurrencyChanges, Enemy, InventoryChange};
use crate::value_objects::{Currency, StatBlock};

/// Clamp an AI-generated item's stats to the ranges of its catalog type.
///
/// Unknown item types pass through unchanged - the model is allowed to
/// invent unique items. For known types, stats without a defined range are
/// kept as-is and `quantity` falls back to 1 when absent or zero.
pub fn validate_item(
    catalog: &GameCatalog,
    item: &InventoryChange,
) -> (InventoryChange, Vec<String>) {
    let Some(item_type) = catalog.item_type(&item.item_type) else {
        return (
            item.clone(),
            vec![format!("Unknown item type: {}", item.item_type)],
        );
    };

    let mut warnings = Vec::new();
    let mut validated = item.clone();

    for (stat_name, stat_value) in &item.stats {
        if let Some(range) = item_type.stat_range(stat_name) {
            let clamped = range.clamp(*stat_value);
            if clamped != *stat_value {
                warnings.push(format!(
                    "Item \"{}\" stat \"{}\" out of range: {} (clamped to {})",
                    item.name, stat_name, stat_value, clamped
                ));
            }
            validated.stats.insert(stat_name.clone(), clamped);
        }
    }

    if validated.quantity == 0 {
        validated.quantity = 1;
    }

    (validated, warnings)
}

/// Clamp an absolute stats bag: hp is floored at 0 and capped at maxHp
/// when one is present. Every other stat passes through unchanged.
pub fn validate_stats(stats: &StatBlock) -> StatBlock {
    let mut validated = stats.clone();

    if validated.hp < 0 {
        validated.hp = 0;
    }
    if let Some(max_hp) = validated.max_hp {
        if validated.hp > max_hp {
            validated.hp = max_hp;
        }
    }

    validated
}

/// Resolve a currency bundle to concrete balances: missing fields default
/// to 0, each denomination is clamped independently. No carry between
/// denominations.
pub fn validate_currency(currency: &CurrencyChanges) -> Currency {
    Currency::new(
        currency.gold.unwrap_or(0),
        currency.silver.unwrap_or(0),
        currency.copper.unwrap_or(0),
    )
    .clamped()
}

/// Outcome of a combat roster validation pass.
#[derive(Debug, Clone)]
pub struct EnemyValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub corrected: Vec<Enemy>,
}

/// Correct obvious errors in the enemy roster.
///
/// Over-max hp is clamped down. Negative hp only records a warning here;
/// dropping defeated enemies is the caller's `hp > 0` post-filter so that
/// a kill reported this turn still appears in the sanitized narrative data.
pub fn validate_enemies(enemies: &[Enemy]) -> EnemyValidation {
    let mut warnings = Vec::new();
    let mut corrected: Vec<Enemy> = enemies.to_vec();

    for enemy in &mut corrected {
        if enemy.hp < 0 {
            warnings.push(format!(
                "Enemy {} HP below 0, deleting from array",
                enemy.name
            ));
        }
        if enemy.hp > enemy.max_hp {
            warnings.push(format!("Enemy {} HP above max, clamping", enemy.name));
            enemy.hp = enemy.max_hp;
        }
    }

    EnemyValidation {
        valid: warnings.is_empty(),
        warnings,
        corrected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn change(item_type: &str, stats: &[(&str, i64)], quantity: i64) -> InventoryChange {
        InventoryChange {
            item_type: item_type.to_string(),
            name: "Test Item".to_string(),
            description: None,
            stats: stats
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            quantity,
        }
    }

    #[test]
    fn test_item_clamping_known_type() {
        let catalog = GameCatalog::standard();
        // weapon_1h_sword minDmg range is [1, 20]
        let (low, warnings) = validate_item(&catalog, &change("weapon_1h_sword", &[("minDmg", 0)], 1));
        assert_eq!(low.stats["minDmg"], 1);
        assert_eq!(warnings.len(), 1);

        let (high, _) = validate_item(&catalog, &change("weapon_1h_sword", &[("minDmg", 999)], 1));
        assert_eq!(high.stats["minDmg"], 20);

        let (ok, warnings) = validate_item(&catalog, &change("weapon_1h_sword", &[("minDmg", 7)], 1));
        assert_eq!(ok.stats["minDmg"], 7);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_item_unknown_stat_passes_through() {
        let catalog = GameCatalog::standard();
        let (validated, warnings) =
            validate_item(&catalog, &change("weapon_1h_sword", &[("shininess", 9000)], 1));
        assert_eq!(validated.stats["shininess"], 9000);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_item_unknown_type_passes_through() {
        let catalog = GameCatalog::standard();
        let original = change("artifact_cursed_crown", &[("doom", 666)], 0);
        let (validated, warnings) = validate_item(&catalog, &original);
        assert_eq!(validated, original);
        assert_eq!(warnings, vec!["Unknown item type: artifact_cursed_crown"]);
    }

    #[test]
    fn test_item_quantity_defaults_to_one() {
        let catalog = GameCatalog::standard();
        let (validated, _) = validate_item(&catalog, &change("consumable_food", &[], 0));
        assert_eq!(validated.quantity, 1);

        let (kept, _) = validate_item(&catalog, &change("consumable_food", &[], -2));
        assert_eq!(kept.quantity, -2);
    }

    #[test]
    fn test_stats_hp_floor_and_ceiling() {
        let negative = validate_stats(&StatBlock::new(-20, Some(100)));
        assert_eq!(negative.hp, 0);

        let overshoot = validate_stats(&StatBlock::new(150, Some(100)));
        assert_eq!(overshoot.hp, 100);

        let no_max = validate_stats(&StatBlock::new(150, None));
        assert_eq!(no_max.hp, 150);
    }

    #[test]
    fn test_stats_validation_is_idempotent() {
        let stats = StatBlock::new(-3, Some(50));
        let once = validate_stats(&stats);
        let twice = validate_stats(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stats_extra_fields_untouched() {
        let mut stats = StatBlock::new(120, Some(100));
        stats
            .extra
            .insert("stamina".to_string(), serde_json::json!(-5));
        let validated = validate_stats(&stats);
        assert_eq!(validated.hp, 100);
        assert_eq!(validated.extra["stamina"], serde_json::json!(-5));
    }

    #[test]
    fn test_currency_bounds() {
        let validated = validate_currency(&CurrencyChanges {
            gold: Some(-50),
            silver: Some(40000),
            copper: None,
        });
        assert_eq!(validated, Currency::new(0, 32767, 0));
    }

    #[test]
    fn test_currency_missing_fields_default_to_zero() {
        let validated = validate_currency(&CurrencyChanges::default());
        assert_eq!(validated, Currency::new(0, 0, 0));
    }

    fn enemy(name: &str, hp: i64, max_hp: i64) -> Enemy {
        Enemy {
            name: name.to_string(),
            hp,
            max_hp,
            armor: 0,
            min_dmg: 1,
            max_dmg: 2,
        }
    }

    #[test]
    fn test_enemies_overmax_clamped_with_warning() {
        let result = validate_enemies(&[enemy("Ghoul", 12, 10)]);
        assert!(!result.valid);
        assert_eq!(result.corrected[0].hp, 10);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_enemies_negative_hp_warns_but_stays() {
        // Removal is the caller's hp > 0 post-filter.
        let result = validate_enemies(&[enemy("Bandit", -4, 30)]);
        assert!(!result.valid);
        assert_eq!(result.corrected.len(), 1);
        assert_eq!(result.corrected[0].hp, -4);
    }

    #[test]
    fn test_enemies_clean_roster_is_valid() {
        let result = validate_enemies(&[enemy("Wolf", 20, 20)]);
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }
}
