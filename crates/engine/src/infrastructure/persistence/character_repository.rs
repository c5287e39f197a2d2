//! Character repository implementation for SQLite.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{Character, CharacterId, UserId};

use super::{parse_id, parse_json, parse_timestamp};
use crate::infrastructure::ports::{CharacterRepo, RepoError};

pub struct SqliteCharacterRepo {
    pool: SqlitePool,
}

impl SqliteCharacterRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CharacterRepo for SqliteCharacterRepo {
    async fn create(&self, character: &Character) -> Result<(), RepoError> {
        let stats_json = serde_json::to_string(&character.stats)
            .map_err(|e| RepoError::serialization(e))?;

        sqlx::query(
            r#"
            INSERT INTO characters
                (id, user_id, name, gender, stats_json, gold, silver, copper, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(character.id.to_string())
        .bind(character.user_id.to_string())
        .bind(&character.name)
        .bind(&character.gender)
        .bind(stats_json)
        .bind(character.currency.gold)
        .bind(character.currency.silver)
        .bind(character.currency.copper)
        .bind(character.created_at.to_rfc3339())
        .bind(character.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("characters.create", e))?;

        tracing::debug!(character_id = %character.id, "Created character");
        Ok(())
    }

    async fn get(&self, id: CharacterId, user_id: UserId) -> Result<Option<Character>, RepoError> {
        let row = sqlx::query("SELECT * FROM characters WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("characters.get", e))?;

        row.map(|r| row_to_character(&r)).transpose()
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<Character>, RepoError> {
        let rows = sqlx::query(
            "SELECT * FROM characters WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("characters.list", e))?;

        rows.iter().map(row_to_character).collect()
    }

    async fn delete(&self, id: CharacterId, user_id: UserId) -> Result<bool, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("characters.delete", e))?;

        let deleted = sqlx::query("DELETE FROM characters WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("characters.delete", e))?
            .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        // Cascade to everything the character owns.
        for statement in [
            "DELETE FROM character_items WHERE character_id = ?",
            "DELETE FROM character_skills WHERE character_id = ?",
            "DELETE FROM stories WHERE character_id = ?",
        ] {
            sqlx::query(statement)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("characters.delete", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("characters.delete", e))?;

        tracing::debug!(character_id = %id, "Deleted character and owned records");
        Ok(true)
    }
}

fn row_to_character(row: &SqliteRow) -> Result<Character, RepoError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepoError::database("characters.row", e))?;
    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| RepoError::database("characters.row", e))?;
    let stats_json: String = row
        .try_get("stats_json")
        .map_err(|e| RepoError::database("characters.row", e))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepoError::database("characters.row", e))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| RepoError::database("characters.row", e))?;

    Ok(Character {
        id: parse_id::<CharacterId>(&id)?,
        user_id: parse_id::<UserId>(&user_id)?,
        name: row
            .try_get("name")
            .map_err(|e| RepoError::database("characters.row", e))?,
        gender: row
            .try_get("gender")
            .map_err(|e| RepoError::database("characters.row", e))?,
        stats: parse_json(&stats_json)?,
        currency: taleforge_domain::Currency::new(
            row.try_get("gold")
                .map_err(|e| RepoError::database("characters.row", e))?,
            row.try_get("silver")
                .map_err(|e| RepoError::database("characters.row", e))?,
            row.try_get("copper")
                .map_err(|e| RepoError::database("characters.row", e))?,
        ),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
