//! Transactional turn application.
//!
//! All mutations of one reconciliation pass, the story's progress append,
//! and the timestamps land in a single SQLite transaction so that a
//! mid-turn failure cannot leave stats applied but inventory missing.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use taleforge_domain::{CharacterItem, Mutation};

use super::item_repository::insert_item;
use crate::infrastructure::ports::{ClockPort, RepoError, TurnWrite, TurnWriter};

pub struct SqliteTurnWriter {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteTurnWriter {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl TurnWriter for SqliteTurnWriter {
    async fn apply_turn(&self, write: TurnWrite) -> Result<(), RepoError> {
        let now = self.clock.now().to_rfc3339();
        let last_response_json = serde_json::to_string(&write.last_response)
            .map_err(|e| RepoError::serialization(e))?;
        let progress_json =
            serde_json::to_string(&write.progress).map_err(|e| RepoError::serialization(e))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("apply_turn", e))?;

        for mutation in &write.mutations {
            match mutation {
                Mutation::SetStats(stats) => {
                    let stats_json = serde_json::to_string(stats)
                        .map_err(|e| RepoError::serialization(e))?;
                    sqlx::query("UPDATE characters SET stats_json = ? WHERE id = ?")
                        .bind(stats_json)
                        .bind(write.character_id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::database("apply_turn.stats", e))?;
                }
                Mutation::SetCurrency(currency) => {
                    sqlx::query(
                        "UPDATE characters SET gold = ?, silver = ?, copper = ? WHERE id = ?",
                    )
                    .bind(currency.gold)
                    .bind(currency.silver)
                    .bind(currency.copper)
                    .bind(write.character_id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::database("apply_turn.currency", e))?;
                }
                Mutation::CreateItem(new_item) => {
                    let item = CharacterItem::from_new(write.character_id, new_item.clone());
                    insert_item(&mut *tx, &item).await?;
                }
                Mutation::SetItemQuantity { item_id, quantity } => {
                    sqlx::query("UPDATE character_items SET quantity = ? WHERE id = ?")
                        .bind(i64::from(*quantity))
                        .bind(item_id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::database("apply_turn.item_quantity", e))?;
                }
                Mutation::DeleteItem { item_id } => {
                    sqlx::query("DELETE FROM character_items WHERE id = ?")
                        .bind(item_id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::database("apply_turn.item_delete", e))?;
                }
                Mutation::UpdateSkill {
                    skill_id,
                    level,
                    xp,
                    leveled_up,
                } => {
                    sqlx::query("UPDATE character_skills SET level = ?, xp = ? WHERE id = ?")
                        .bind(i64::from(*level))
                        .bind(*xp as i64)
                        .bind(skill_id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::database("apply_turn.skill", e))?;
                    if *leveled_up {
                        tracing::info!(skill_id = %skill_id, level = level, "Skill leveled up");
                    }
                }
            }
        }

        sqlx::query("UPDATE characters SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(write.character_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("apply_turn.touch", e))?;

        sqlx::query(
            "UPDATE stories SET last_response_json = ?, progress_json = ?, updated_at = ? WHERE id = ?",
        )
        .bind(last_response_json)
        .bind(progress_json)
        .bind(&now)
        .bind(write.story_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("apply_turn.story", e))?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("apply_turn.commit", e))?;

        tracing::debug!(
            story_id = %write.story_id,
            character_id = %write.character_id,
            mutations = write.mutations.len(),
            "Applied turn"
        );
        Ok(())
    }
}
