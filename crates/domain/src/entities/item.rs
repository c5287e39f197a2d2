//! Item entity - one inventory row owned by a character.
//!
//! `item_type` is either a key into the catalog's item-type table or a free
//! string for model-invented unique items. A row's stats were clamped at
//! reconciliation time; rows with the same type are separate stacks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, ItemId};

/// An item instance in a character's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterItem {
    pub id: ItemId,
    pub character_id: CharacterId,
    pub item_type: String,
    pub name: String,
    pub description: String,
    pub stats: BTreeMap<String, i64>,
    pub quantity: u32,
    pub equipped: bool,
}

impl CharacterItem {
    pub fn from_new(character_id: CharacterId, new: NewItem) -> Self {
        Self {
            id: ItemId::new(),
            character_id,
            item_type: new.item_type,
            name: new.name,
            description: new.description,
            stats: new.stats,
            quantity: new.quantity,
            equipped: new.equipped,
        }
    }
}

/// Payload for creating an item row (starter loadout or a reconciled gain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub item_type: String,
    pub name: String,
    pub description: String,
    pub stats: BTreeMap<String, i64>,
    pub quantity: u32,
    pub equipped: bool,
}
