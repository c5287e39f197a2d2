//! SQLite-backed persistence adapters.

mod character_repository;
mod connection;
mod item_repository;
mod skill_repository;
mod story_repository;
mod turn_writer;

use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use sqlx::SqlitePool;

pub use character_repository::SqliteCharacterRepo;
pub use connection::{connect, ensure_schema};
pub use item_repository::SqliteItemRepo;
pub use skill_repository::SqliteSkillRepo;
pub use story_repository::SqliteStoryRepo;
pub use turn_writer::SqliteTurnWriter;

use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, ItemRepo, RepoError, SkillRepo, StoryRepo, TurnWriter,
};

/// All repository ports backed by one SQLite pool.
pub struct SqliteRepositories {
    pub characters: Arc<dyn CharacterRepo>,
    pub items: Arc<dyn ItemRepo>,
    pub skills: Arc<dyn SkillRepo>,
    pub stories: Arc<dyn StoryRepo>,
    pub turn_writer: Arc<dyn TurnWriter>,
}

impl SqliteRepositories {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            characters: Arc::new(SqliteCharacterRepo::new(pool.clone())),
            items: Arc::new(SqliteItemRepo::new(pool.clone())),
            skills: Arc::new(SqliteSkillRepo::new(pool.clone())),
            stories: Arc::new(SqliteStoryRepo::new(pool.clone())),
            turn_writer: Arc::new(SqliteTurnWriter::new(pool, clock)),
        }
    }
}

fn parse_id<T>(value: &str) -> Result<T, RepoError>
where
    T: FromStr<Err = uuid::Error>,
{
    T::from_str(value).map_err(|e| RepoError::serialization(format!("bad id {value}: {e}")))
}

fn parse_json<T: DeserializeOwned>(value: &str) -> Result<T, RepoError> {
    serde_json::from_str(value).map_err(|e| RepoError::serialization(e))
}

fn parse_timestamp(value: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use chrono::Utc;
    use taleforge_domain::{
        loadout, Character, CharacterItem, CharacterSkill, Currency, Mutation, NewItem,
        ProgressEntry, StatBlock, Story, StoryResponse, UserId,
    };

    async fn repositories() -> SqliteRepositories {
        let pool = connection::connect_in_memory().await.expect("in-memory db");
        SqliteRepositories::new(pool, Arc::new(SystemClock))
    }

    fn test_character(user_id: UserId) -> Character {
        Character::new(
            user_id,
            "Brannic",
            "male",
            loadout::initial_stats(),
            loadout::starter_currency(),
            Utc::now(),
        )
    }

    fn test_response(text: &str) -> StoryResponse {
        StoryResponse::from_json_str(&format!(
            r#"{{"story_text": "{text}", "choices": [{{"id": "choice_1", "text": "Go on"}}]}}"#
        ))
        .expect("valid test response")
    }

    #[tokio::test]
    async fn test_character_roundtrip_and_ownership() {
        let repos = repositories().await;
        let user_id = UserId::new();
        let character = test_character(user_id);

        repos.characters.create(&character).await.expect("create");

        let loaded = repos
            .characters
            .get(character.id, user_id)
            .await
            .expect("get")
            .expect("found");
        assert_eq!(loaded.name, "Brannic");
        assert_eq!(loaded.stats.hp, 100);
        assert_eq!(loaded.currency, Currency::new(0, 4, 5));

        // Another user cannot see it.
        let other = repos
            .characters
            .get(character.id, UserId::new())
            .await
            .expect("get");
        assert!(other.is_none());

        let listed = repos.characters.list(user_id).await.expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_items_and_skills_roundtrip() {
        let repos = repositories().await;
        let user_id = UserId::new();
        let character = test_character(user_id);
        repos.characters.create(&character).await.expect("create");

        for new_item in loadout::starter_items() {
            repos
                .items
                .create(&CharacterItem::from_new(character.id, new_item))
                .await
                .expect("create item");
        }
        for starter in loadout::starter_skills() {
            repos
                .skills
                .create(&CharacterSkill::new(
                    character.id,
                    starter.skill_key,
                    starter.name,
                    starter.description,
                    1,
                    0,
                ))
                .await
                .expect("create skill");
        }

        let items = repos
            .items
            .list_for_character(character.id)
            .await
            .expect("list items");
        assert_eq!(items.len(), 3);
        assert!(items.iter().any(|i| i.item_type == "weapon_1h_sword" && i.equipped));

        let skills = repos
            .skills
            .list_for_character(character.id)
            .await
            .expect("list skills");
        assert_eq!(skills.len(), 7);
        assert!(skills.iter().all(|s| s.level == 1 && s.xp == 0));
    }

    #[tokio::test]
    async fn test_apply_turn_is_atomic_across_tables() {
        let repos = repositories().await;
        let user_id = UserId::new();
        let character = test_character(user_id);
        repos.characters.create(&character).await.expect("create");

        let bread = CharacterItem::from_new(
            character.id,
            NewItem {
                item_type: "consumable_food".to_string(),
                name: "Stale Bread".to_string(),
                description: String::new(),
                stats: Default::default(),
                quantity: 2,
                equipped: false,
            },
        );
        repos.items.create(&bread).await.expect("create item");

        let skill = CharacterSkill::new(character.id, "dodge", "Dodge", "", 1, 8);
        repos.skills.create(&skill).await.expect("create skill");

        let first = test_response("You arrive at dusk.");
        let story = Story::new(user_id, character.id, "Brannic's Adventure", first, Utc::now());
        repos.stories.create(&story).await.expect("create story");

        let sanitized = test_response("The wolf falls.");
        let mut progress = story.progress.clone();
        progress.push(ProgressEntry::with_input(
            story.last_response.clone(),
            "Fight the wolf",
        ));
        progress.push(ProgressEntry::new(sanitized.clone()));

        repos
            .turn_writer
            .apply_turn(crate::infrastructure::ports::TurnWrite {
                story_id: story.id,
                character_id: character.id,
                mutations: vec![
                    Mutation::SetStats(StatBlock::new(70, Some(100))),
                    Mutation::DeleteItem { item_id: bread.id },
                    Mutation::CreateItem(NewItem {
                        item_type: "misc_material".to_string(),
                        name: "Wolf Pelt".to_string(),
                        description: String::new(),
                        stats: Default::default(),
                        quantity: 1,
                        equipped: false,
                    }),
                    Mutation::SetCurrency(Currency::new(0, 6, 5)),
                    Mutation::UpdateSkill {
                        skill_id: skill.id,
                        level: 2,
                        xp: 3,
                        leveled_up: true,
                    },
                ],
                progress: progress.clone(),
                last_response: sanitized.clone(),
            })
            .await
            .expect("apply turn");

        let character_after = repos
            .characters
            .get(character.id, user_id)
            .await
            .expect("get")
            .expect("found");
        assert_eq!(character_after.stats.hp, 70);
        assert_eq!(character_after.currency, Currency::new(0, 6, 5));

        let items = repos
            .items
            .list_for_character(character.id)
            .await
            .expect("list items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Wolf Pelt");

        let skills = repos
            .skills
            .list_for_character(character.id)
            .await
            .expect("list skills");
        assert_eq!(skills[0].level, 2);
        assert_eq!(skills[0].xp, 3);

        let story_after = repos
            .stories
            .get(story.id, user_id)
            .await
            .expect("get story")
            .expect("found");
        assert_eq!(story_after.progress.len(), 3);
        assert_eq!(story_after.last_response, sanitized);

        let last = repos
            .stories
            .get_last_response(story.id, user_id)
            .await
            .expect("get last")
            .expect("found");
        assert_eq!(last.story_text, "The wolf falls.");
    }

    #[tokio::test]
    async fn test_delete_character_cascades() {
        let repos = repositories().await;
        let user_id = UserId::new();
        let character = test_character(user_id);
        repos.characters.create(&character).await.expect("create");

        repos
            .items
            .create(&CharacterItem::from_new(
                character.id,
                loadout::starter_items().remove(0),
            ))
            .await
            .expect("create item");

        let story = Story::new(
            user_id,
            character.id,
            "Doomed Adventure",
            test_response("A short life."),
            Utc::now(),
        );
        repos.stories.create(&story).await.expect("create story");

        // Wrong owner deletes nothing.
        assert!(!repos
            .characters
            .delete(character.id, UserId::new())
            .await
            .expect("delete"));

        assert!(repos
            .characters
            .delete(character.id, user_id)
            .await
            .expect("delete"));

        assert!(repos
            .characters
            .get(character.id, user_id)
            .await
            .expect("get")
            .is_none());
        assert!(repos
            .items
            .list_for_character(character.id)
            .await
            .expect("list")
            .is_empty());
        assert!(repos
            .stories
            .get(story.id, user_id)
            .await
            .expect("get story")
            .is_none());
    }
}
