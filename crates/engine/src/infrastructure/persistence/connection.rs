//! SQLite connection management and schema initialization.

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        gender TEXT NOT NULL,
        stats_json TEXT NOT NULL,
        gold INTEGER NOT NULL,
        silver INTEGER NOT NULL,
        copper INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS characters_user ON characters(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS character_items (
        id TEXT PRIMARY KEY,
        character_id TEXT NOT NULL,
        item_type TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        stats_json TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        equipped INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS character_items_character ON character_items(character_id)",
    r#"
    CREATE TABLE IF NOT EXISTS character_skills (
        id TEXT PRIMARY KEY,
        character_id TEXT NOT NULL,
        skill_key TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        level INTEGER NOT NULL,
        xp INTEGER NOT NULL,
        UNIQUE (character_id, skill_key)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stories (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        character_id TEXT NOT NULL,
        name TEXT NOT NULL,
        last_response_json TEXT NOT NULL,
        progress_json TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS stories_user ON stories(user_id)",
    "CREATE INDEX IF NOT EXISTS stories_character ON stories(character_id)",
];

/// Open (or create) the database file and ensure the schema exists.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{db_path}?mode=rwc"))
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests. Pinned to a single connection so every
/// query sees the same database.
#[cfg(test)]
pub async fn connect_in_memory() -> Result<SqlitePool, RepoError> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("ensure_schema", e))?;
    }
    tracing::info!("Database schema initialized");
    Ok(())
}
