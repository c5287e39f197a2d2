//! Story repository implementation for SQLite.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{CharacterId, Story, StoryId, StoryResponse, UserId};

use super::{parse_id, parse_json, parse_timestamp};
use crate::infrastructure::ports::{RepoError, StoryRepo};

pub struct SqliteStoryRepo {
    pool: SqlitePool,
}

impl SqliteStoryRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryRepo for SqliteStoryRepo {
    async fn create(&self, story: &Story) -> Result<(), RepoError> {
        let last_response_json = serde_json::to_string(&story.last_response)
            .map_err(|e| RepoError::serialization(e))?;
        let progress_json =
            serde_json::to_string(&story.progress).map_err(|e| RepoError::serialization(e))?;

        sqlx::query(
            r#"
            INSERT INTO stories
                (id, user_id, character_id, name, last_response_json, progress_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(story.id.to_string())
        .bind(story.user_id.to_string())
        .bind(story.character_id.to_string())
        .bind(&story.name)
        .bind(last_response_json)
        .bind(progress_json)
        .bind(story.created_at.to_rfc3339())
        .bind(story.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("stories.create", e))?;

        tracing::debug!(story_id = %story.id, "Created story");
        Ok(())
    }

    async fn get(&self, id: StoryId, user_id: UserId) -> Result<Option<Story>, RepoError> {
        let row = sqlx::query("SELECT * FROM stories WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("stories.get", e))?;

        row.map(|r| row_to_story(&r)).transpose()
    }

    async fn get_last_response(
        &self,
        id: StoryId,
        user_id: UserId,
    ) -> Result<Option<StoryResponse>, RepoError> {
        let row = sqlx::query(
            "SELECT last_response_json FROM stories WHERE id = ? AND user_id = ?",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("stories.get_last_response", e))?;

        row.map(|r| {
            let json: String = r
                .try_get("last_response_json")
                .map_err(|e| RepoError::database("stories.row", e))?;
            parse_json(&json)
        })
        .transpose()
    }
}

fn row_to_story(row: &SqliteRow) -> Result<Story, RepoError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepoError::database("stories.row", e))?;
    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| RepoError::database("stories.row", e))?;
    let character_id: String = row
        .try_get("character_id")
        .map_err(|e| RepoError::database("stories.row", e))?;
    let last_response_json: String = row
        .try_get("last_response_json")
        .map_err(|e| RepoError::database("stories.row", e))?;
    let progress_json: String = row
        .try_get("progress_json")
        .map_err(|e| RepoError::database("stories.row", e))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepoError::database("stories.row", e))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| RepoError::database("stories.row", e))?;

    Ok(Story {
        id: parse_id::<StoryId>(&id)?,
        user_id: parse_id::<UserId>(&user_id)?,
        character_id: parse_id::<CharacterId>(&character_id)?,
        name: row
            .try_get("name")
            .map_err(|e| RepoError::database("stories.row", e))?,
        last_response: parse_json(&last_response_json)?,
        progress: parse_json(&progress_json)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
