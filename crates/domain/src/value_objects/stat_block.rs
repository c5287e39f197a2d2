//! Character stats bag.
//!
//! Hit points are first-class; any other stat the game master invents rides
//! along in `extra` untouched by validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The stats attached to a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: i64,
    #[serde(rename = "maxHp", skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StatBlock {
    pub fn new(hp: i64, max_hp: Option<i64>) -> Self {
        Self {
            hp,
            max_hp,
            extra: BTreeMap::new(),
        }
    }

    /// The stat block with `hp` replaced, everything else carried over.
    pub fn with_hp(&self, hp: i64) -> Self {
        Self {
            hp,
            max_hp: self.max_hp,
            extra: self.extra.clone(),
        }
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::new(0, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_field_names() {
        let stats = StatBlock::new(70, Some(100));
        let json = serde_json::to_value(&stats).expect("serializable");
        assert_eq!(json["hp"], 70);
        assert_eq!(json["maxHp"], 100);
    }

    #[test]
    fn test_extra_stats_roundtrip() {
        let json = r#"{"hp": 50, "maxHp": 100, "stamina": 30}"#;
        let stats: StatBlock = serde_json::from_str(json).expect("parses");
        assert_eq!(stats.hp, 50);
        assert_eq!(stats.extra.get("stamina"), Some(&serde_json::json!(30)));

        let back = serde_json::to_value(&stats).expect("serializable");
        assert_eq!(back["stamina"], 30);
    }

    #[test]
    fn test_missing_max_hp_not_serialized() {
        let stats = StatBlock::new(10, None);
        let json = serde_json::to_value(&stats).expect("serializable");
        assert!(json.get("maxHp").is_none());
    }
}
