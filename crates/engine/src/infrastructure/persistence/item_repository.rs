//! Item repository implementation for SQLite.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{CharacterId, CharacterItem, ItemId};

use super::{parse_id, parse_json};
use crate::infrastructure::ports::{ItemRepo, RepoError};

pub struct SqliteItemRepo {
    pool: SqlitePool,
}

impl SqliteItemRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepo for SqliteItemRepo {
    async fn create(&self, item: &CharacterItem) -> Result<(), RepoError> {
        insert_item(&self.pool, item).await
    }

    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CharacterItem>, RepoError> {
        let rows = sqlx::query(
            "SELECT * FROM character_items WHERE character_id = ? ORDER BY rowid",
        )
        .bind(character_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("items.list", e))?;

        rows.iter().map(row_to_item).collect()
    }
}

/// Shared insert used by the repo and the transactional turn writer.
pub(super) async fn insert_item<'e, E>(executor: E, item: &CharacterItem) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let stats_json =
        serde_json::to_string(&item.stats).map_err(|e| RepoError::serialization(e))?;

    sqlx::query(
        r#"
        INSERT INTO character_items
            (id, character_id, item_type, name, description, stats_json, quantity, equipped)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.id.to_string())
    .bind(item.character_id.to_string())
    .bind(&item.item_type)
    .bind(&item.name)
    .bind(&item.description)
    .bind(stats_json)
    .bind(i64::from(item.quantity))
    .bind(item.equipped)
    .execute(executor)
    .await
    .map_err(|e| RepoError::database("items.create", e))?;

    Ok(())
}

fn row_to_item(row: &SqliteRow) -> Result<CharacterItem, RepoError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepoError::database("items.row", e))?;
    let character_id: String = row
        .try_get("character_id")
        .map_err(|e| RepoError::database("items.row", e))?;
    let stats_json: String = row
        .try_get("stats_json")
        .map_err(|e| RepoError::database("items.row", e))?;
    let quantity: i64 = row
        .try_get("quantity")
        .map_err(|e| RepoError::database("items.row", e))?;

    Ok(CharacterItem {
        id: parse_id::<ItemId>(&id)?,
        character_id: parse_id::<CharacterId>(&character_id)?,
        item_type: row
            .try_get("item_type")
            .map_err(|e| RepoError::database("items.row", e))?,
        name: row
            .try_get("name")
            .map_err(|e| RepoError::database("items.row", e))?,
        description: row
            .try_get("description")
            .map_err(|e| RepoError::database("items.row", e))?,
        stats: parse_json(&stats_json)?,
        quantity: u32::try_from(quantity)
            .map_err(|_| RepoError::serialization(format!("negative quantity {quantity}")))?,
        equipped: row
            .try_get("equipped")
            .map_err(|e| RepoError::database("items.row", e))?,
    })
}
