//! Skill progression engine - converts skill usage into XP and level-ups.

use crate::catalog::GameCatalog;

/// XP granted per reported skill use.
pub const XP_PER_USE: u64 = 1;

/// Result of applying usage to one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillProgress {
    pub level: u32,
    pub xp: u64,
    pub leveled_up: bool,
}

/// Apply `usage_count` uses to a skill at `(current_level, current_xp)`.
///
/// Accumulated XP is spent against the curve one level at a time until it
/// no longer covers the next requirement, the curve runs out, or the level
/// cap is reached. At the cap, leftover XP is discarded - it is not banked.
/// Negative usage counts (a confused model) grant nothing.
pub fn apply_usage(
    catalog: &GameCatalog,
    current_level: u32,
    current_xp: u64,
    usage_count: i64,
) -> SkillProgress {
    let xp_gained = u64::try_from(usage_count.max(0)).unwrap_or(0) * XP_PER_USE;

    let mut level = current_level;
    let mut xp = current_xp + xp_gained;
    let mut leveled_up = false;

    while level < catalog.max_skill_level() {
        let Some(xp_needed) = catalog.xp_to_advance(level) else {
            break;
        };

        if xp >= xp_needed {
            xp -= xp_needed;
            level += 1;
            leveled_up = true;
        } else {
            break;
        }
    }

    if level >= catalog.max_skill_level() {
        level = catalog.max_skill_level();
        xp = 0;
    }

    SkillProgress {
        level,
        xp,
        leveled_up: leveled_up && level > current_level,
    }
}
