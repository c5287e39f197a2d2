//! Skill entity - one learned skill owned by a character.

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, SkillId};

/// A character's proficiency in one catalog skill.
///
/// `(character_id, skill_key)` is unique. At the maximum level `xp` is
/// always zero; progression discards overflow at the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSkill {
    pub id: SkillId,
    pub character_id: CharacterId,
    #[serde(rename = "skillId")]
    pub skill_key: String,
    pub name: String,
    pub description: String,
    pub level: u32,
    pub xp: u64,
}

impl CharacterSkill {
    pub fn new(
        character_id: CharacterId,
        skill_key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        level: u32,
        xp: u64,
    ) -> Self {
        Self {
            id: SkillId::new(),
            character_id,
            skill_key: skill_key.into(),
            name: name.into(),
            description: description.into(),
            level,
            xp,
        }
    }
}
