//! Response reconciliation - folds one game-master response into
//! authoritative character state.
//!
//! A reconciliation pass runs five phases in a fixed order (stats,
//! inventory, currency, enemies, skills) against the pre-mutation snapshot
//! it was given. It produces a sanitized response safe to show the player
//! plus the set of mutations to persist; it performs no I/O itself, and
//! nothing here re-reads state between phases.

use crate::catalog::GameCatalog;
use crate::entities::{CharacterItem, CharacterSkill, NewItem};
use crate::ids::{ItemId, SkillId};
use crate::progression;
use crate::turn::{CurrencyChanges, StatsChanges, StoryResponse};
use crate::validation::{validate_currency, validate_enemies, validate_item, validate_stats};
use crate::value_objects::{Currency, StatBlock};

/// Pre-mutation view of the character a response is reconciled against.
#[derive(Debug, Clone)]
pub struct CharacterSnapshot {
    pub stats: StatBlock,
    pub currency: Currency,
    pub items: Vec<CharacterItem>,
    pub skills: Vec<CharacterSkill>,
}

/// One persistence operation produced by a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace the character's stats with these absolute values.
    SetStats(StatBlock),
    /// Replace the character's coin balances with these absolute values.
    SetCurrency(Currency),
    /// Insert a new inventory row.
    CreateItem(NewItem),
    /// Update an existing inventory row's stack size.
    SetItemQuantity { item_id: ItemId, quantity: u32 },
    /// Remove an inventory row whose stack was consumed.
    DeleteItem { item_id: ItemId },
    /// Write back one skill's progression.
    UpdateSkill {
        skill_id: SkillId,
        level: u32,
        xp: u64,
        leveled_up: bool,
    },
}

/// How inventory gains interact with existing stacks of the same type.
///
/// Gains always append a new row today: each gained item may carry its own
/// rolled stats, so merging into an existing stack would lose them. A merge
/// policy would be a new variant here, not a silent behavior change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InventoryPolicy {
    #[default]
    AlwaysAppend,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub sanitized: StoryResponse,
    pub mutations: Vec<Mutation>,
    pub warnings: Vec<String>,
}

/// Reconcile one parsed response against the character snapshot.
pub fn reconcile(
    catalog: &GameCatalog,
    snapshot: &CharacterSnapshot,
    response: &StoryResponse,
    policy: InventoryPolicy,
) -> Reconciliation {
    let mut sanitized = response.clone();
    let mut mutations = Vec::new();
    let mut warnings = Vec::new();

    // Phase 1: stats. The validator works on the absolute bag; the delta
    // shown to the player is re-derived from the validated value.
    if let Some(stats_changes) = &response.stats_changes {
        let delta = stats_changes.hp.unwrap_or(0);
        let candidate = snapshot.stats.with_hp(snapshot.stats.hp + delta);
        let validated = validate_stats(&candidate);

        sanitized.stats_changes = Some(StatsChanges {
            hp: Some(validated.hp - snapshot.stats.hp),
        });
        mutations.push(Mutation::SetStats(validated));
    }

    // Phase 2: inventory.
    if let Some(changes) = &response.inventory_changes {
        if !changes.is_empty() {
            // Stack sizes as they evolve within this phase, so two
            // decrements of the same type compound instead of both reading
            // the snapshot quantity.
            let mut working: std::collections::BTreeMap<ItemId, i64> = snapshot
                .items
                .iter()
                .map(|item| (item.id, i64::from(item.quantity)))
                .collect();

            let mut sanitized_changes = Vec::with_capacity(changes.len());

            for change in changes {
                let (validated, item_warnings) = validate_item(catalog, change);
                warnings.extend(item_warnings);

                if validated.quantity > 0 {
                    let InventoryPolicy::AlwaysAppend = policy;
                    mutations.push(Mutation::CreateItem(NewItem {
                        item_type: validated.item_type.clone(),
                        name: validated.name.clone(),
                        description: validated.description.clone().unwrap_or_default(),
                        stats: validated.stats.clone(),
                        quantity: u32::try_from(validated.quantity).unwrap_or(u32::MAX),
                        equipped: false,
                    }));
                } else if validated.quantity < 0 {
                    let existing = snapshot.items.iter().find(|item| {
                        item.item_type == validated.item_type
                            && working.get(&item.id).copied().unwrap_or(0) > 0
                    });

                    match existing {
                        Some(item) => {
                            let current = working.get(&item.id).copied().unwrap_or(0);
                            let new_quantity = current + validated.quantity;
                            if new_quantity <= 0 {
                                mutations.push(Mutation::DeleteItem { item_id: item.id });
                                working.insert(item.id, 0);
                            } else {
                                mutations.push(Mutation::SetItemQuantity {
                                    item_id: item.id,
                                    quantity: new_quantity as u32,
                                });
                                working.insert(item.id, new_quantity);
                            }
                        }
                        // The character never had one; the decrement is
                        // dropped silently.
                        None => {}
                    }
                }

                sanitized_changes.push(validated);
            }

            sanitized.inventory_changes = Some(sanitized_changes);
        }
    }

    // Phase 3: currency. Deltas are applied to the snapshot balances and
    // the absolute result is clamped per denomination.
    if let Some(currency_changes) = &response.currency_changes {
        let validated = validate_currency(&CurrencyChanges {
            gold: Some(snapshot.currency.gold + currency_changes.gold.unwrap_or(0)),
            silver: Some(snapshot.currency.silver + currency_changes.silver.unwrap_or(0)),
            copper: Some(snapshot.currency.copper + currency_changes.copper.unwrap_or(0)),
        });

        sanitized.currency_changes = Some(CurrencyChanges {
            gold: Some(validated.gold - snapshot.currency.gold),
            silver: Some(validated.silver - snapshot.currency.silver),
            copper: Some(validated.copper - snapshot.currency.copper),
        });
        mutations.push(Mutation::SetCurrency(validated));
    }

    // Phase 4: enemies. Defeated enemies drop out of the active roster
    // here; an empty roster means combat has ended.
    if let Some(enemies) = &response.enemies {
        if !enemies.is_empty() {
            let result = validate_enemies(enemies);
            warnings.extend(result.warnings);
            sanitized.enemies = Some(
                result
                    .corrected
                    .into_iter()
                    .filter(|enemy| enemy.hp > 0)
                    .collect(),
            );
        }
    }

    // Phase 5: skills. Each skill update is isolated; an unknown skill is
    // skipped without touching the others.
    if let Some(usages) = &response.skills_used {
        for usage in usages {
            let Some(skill) = snapshot
                .skills
                .iter()
                .find(|s| s.skill_key == usage.skill_key)
            else {
                warnings.push(format!("Skill {} not found for character", usage.skill_key));
                continue;
            };

            let progress = progression::apply_usage(catalog, skill.level, skill.xp, usage.usage_count);
            mutations.push(Mutation::UpdateSkill {
                skill_id: skill.id,
                level: progress.level,
                xp: progress.xp,
                leveled_up: progress.leveled_up,
            });
        }
    }

    Reconciliation {
        sanitized,
        mutations,
        warnings,
    }
}
