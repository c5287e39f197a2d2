//! Skill repository implementation for SQLite.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use taleforge_domain::{CharacterId, CharacterSkill, SkillId};

use super::parse_id;
use crate::infrastructure::ports::{RepoError, SkillRepo};

pub struct SqliteSkillRepo {
    pool: SqlitePool,
}

impl SqliteSkillRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SkillRepo for SqliteSkillRepo {
    async fn create(&self, skill: &CharacterSkill) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO character_skills
                (id, character_id, skill_key, name, description, level, xp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(skill.id.to_string())
        .bind(skill.character_id.to_string())
        .bind(&skill.skill_key)
        .bind(&skill.name)
        .bind(&skill.description)
        .bind(i64::from(skill.level))
        .bind(skill.xp as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("skills.create", e))?;

        Ok(())
    }

    async fn list_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CharacterSkill>, RepoError> {
        let rows = sqlx::query(
            "SELECT * FROM character_skills WHERE character_id = ? ORDER BY skill_key",
        )
        .bind(character_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("skills.list", e))?;

        rows.iter().map(row_to_skill).collect()
    }
}

fn row_to_skill(row: &SqliteRow) -> Result<CharacterSkill, RepoError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepoError::database("skills.row", e))?;
    let character_id: String = row
        .try_get("character_id")
        .map_err(|e| RepoError::database("skills.row", e))?;
    let level: i64 = row
        .try_get("level")
        .map_err(|e| RepoError::database("skills.row", e))?;
    let xp: i64 = row
        .try_get("xp")
        .map_err(|e| RepoError::database("skills.row", e))?;

    Ok(CharacterSkill {
        id: parse_id::<SkillId>(&id)?,
        character_id: parse_id::<CharacterId>(&character_id)?,
        skill_key: row
            .try_get("skill_key")
            .map_err(|e| RepoError::database("skills.row", e))?,
        name: row
            .try_get("name")
            .map_err(|e| RepoError::database("skills.row", e))?,
        description: row
            .try_get("description")
            .map_err(|e| RepoError::database("skills.row", e))?,
        level: u32::try_from(level)
            .map_err(|_| RepoError::serialization(format!("negative level {level}")))?,
        xp: u64::try_from(xp)
            .map_err(|_| RepoError::serialization(format!("negative xp {xp}")))?,
    })
}
