//! Turn orchestration tests against mocked ports.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use taleforge_domain::{
    loadout, Character, CharacterId, GameCatalog, Mutation, StatBlock, Story, StoryResponse,
    UserId,
};

use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::ports::{
    LlmResponse, MockCharacterRepo, MockItemRepo, MockLlmPort, MockSkillRepo, MockStoryRepo,
    MockTurnWriter,
};
use crate::infrastructure::state::TurnLeases;
use crate::use_cases::characters::CharacterOps;

use super::{ContinueStory, ContinueStoryStream, StartStory, TurnError};

fn catalog() -> Arc<GameCatalog> {
    Arc::new(GameCatalog::standard())
}

fn make_character(user_id: UserId) -> Character {
    Character::new(
        user_id,
        "Brannic",
        "male",
        loadout::initial_stats(),
        loadout::starter_currency(),
        Utc::now(),
    )
}

fn minimal_response(text: &str) -> StoryResponse {
    StoryResponse::from_json_str(&format!(
        r#"{{"story_text": "{text}", "choices": [{{"id": "choice_1", "text": "Go on"}}]}}"#
    ))
    .expect("valid test response")
}

fn make_story(user_id: UserId, character_id: CharacterId) -> Story {
    Story::new(
        user_id,
        character_id,
        "Brannic's Adventure",
        minimal_response("You arrive at dusk."),
        Utc::now(),
    )
}

fn wolf_turn_json() -> &'static str {
    r#"{
        "story_text": "The wolf lunges.",
        "choices": [{"id": "choice_1", "text": "Strike"}],
        "stats_changes": {"hp": -30},
        "enemies": [{"name": "Wolf", "hp": 20, "maxHp": 20, "armor": 0, "minDmg": 2, "maxDmg": 4}]
    }"#
}

struct ContinueFixture {
    stories: MockStoryRepo,
    characters: MockCharacterRepo,
    items: MockItemRepo,
    skills: MockSkillRepo,
    turn_writer: MockTurnWriter,
    llm: MockLlmPort,
    leases: TurnLeases,
}

impl ContinueFixture {
    fn new() -> Self {
        Self {
            stories: MockStoryRepo::new(),
            characters: MockCharacterRepo::new(),
            items: MockItemRepo::new(),
            skills: MockSkillRepo::new(),
            turn_writer: MockTurnWriter::new(),
            llm: MockLlmPort::new(),
            leases: TurnLeases::new(),
        }
    }

    fn build(self) -> ContinueStory {
        ContinueStory::new(
            Arc::new(self.stories),
            Arc::new(self.characters),
            Arc::new(self.items),
            Arc::new(self.skills),
            Arc::new(self.turn_writer),
            Arc::new(self.llm),
            catalog(),
            self.leases,
        )
    }
}

#[tokio::test]
async fn test_continue_turn_applies_sanitized_mutations() {
    let user_id = UserId::new();
    let character = make_character(user_id);
    let story = make_story(user_id, character.id);
    let story_id = story.id;

    let mut fixture = ContinueFixture::new();

    let story_clone = story.clone();
    fixture
        .stories
        .expect_get()
        .returning(move |_, _| Ok(Some(story_clone.clone())));
    let character_clone = character.clone();
    fixture
        .characters
        .expect_get()
        .returning(move |_, _| Ok(Some(character_clone.clone())));
    fixture
        .items
        .expect_list_for_character()
        .returning(|_| Ok(Vec::new()));
    fixture
        .skills
        .expect_list_for_character()
        .returning(|_| Ok(Vec::new()));
    fixture.llm.expect_generate().returning(|_| {
        Ok(LlmResponse {
            content: wolf_turn_json().to_string(),
            usage: None,
        })
    });
    fixture
        .turn_writer
        .expect_apply_turn()
        .withf(|write| {
            write.mutations == vec![Mutation::SetStats(StatBlock::new(70, Some(100)))]
                && write.progress.len() == 3
                && write.last_response.story_text == "The wolf lunges."
        })
        .times(1)
        .returning(|_| Ok(()));

    let use_case = fixture.build();
    let sanitized = use_case
        .execute(user_id, story_id, "Walk into the forest")
        .await
        .expect("turn succeeds");

    assert_eq!(sanitized.stats_changes.and_then(|s| s.hp), Some(-30));
    let roster = sanitized.enemies.expect("roster");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].name, "Wolf");
}

#[tokio::test]
async fn test_malformed_llm_text_aborts_without_mutation() {
    let user_id = UserId::new();
    let character = make_character(user_id);
    let story = make_story(user_id, character.id);
    let story_id = story.id;

    let mut fixture = ContinueFixture::new();

    let story_clone = story.clone();
    fixture
        .stories
        .expect_get()
        .returning(move |_, _| Ok(Some(story_clone.clone())));
    let character_clone = character.clone();
    fixture
        .characters
        .expect_get()
        .returning(move |_, _| Ok(Some(character_clone.clone())));
    fixture
        .items
        .expect_list_for_character()
        .returning(|_| Ok(Vec::new()));
    fixture
        .skills
        .expect_list_for_character()
        .returning(|_| Ok(Vec::new()));
    fixture.llm.expect_generate().returning(|_| {
        Ok(LlmResponse {
            content: "I cannot continue this story.".to_string(),
            usage: None,
        })
    });
    fixture.turn_writer.expect_apply_turn().never();

    let use_case = fixture.build();
    let result = use_case.execute(user_id, story_id, "Fight").await;

    assert!(matches!(result, Err(TurnError::Parse(_))));
}

#[tokio::test]
async fn test_unknown_story_is_not_found() {
    let mut fixture = ContinueFixture::new();
    fixture.stories.expect_get().returning(|_, _| Ok(None));

    let use_case = fixture.build();
    let result = use_case
        .execute(UserId::new(), taleforge_domain::StoryId::new(), "Hello")
        .await;

    assert!(matches!(result, Err(TurnError::NotFound)));
}

#[tokio::test]
async fn test_concurrent_turn_is_rejected() {
    let user_id = UserId::new();
    let character = make_character(user_id);
    let story = make_story(user_id, character.id);
    let story_id = story.id;
    let character_id = character.id;

    let mut fixture = ContinueFixture::new();
    let story_clone = story.clone();
    fixture
        .stories
        .expect_get()
        .returning(move |_, _| Ok(Some(story_clone.clone())));

    let leases = fixture.leases.clone();
    let _held = leases.try_acquire(character_id).expect("lease");

    let use_case = fixture.build();
    let result = use_case.execute(user_id, story_id, "Fight").await;

    assert!(matches!(result, Err(TurnError::TurnInProgress)));
}

fn character_ops(
    characters: MockCharacterRepo,
    items: MockItemRepo,
    skills: MockSkillRepo,
) -> Arc<CharacterOps> {
    Arc::new(CharacterOps::new(
        Arc::new(characters),
        Arc::new(items),
        Arc::new(skills),
        Arc::new(SystemClock),
    ))
}

#[tokio::test]
async fn test_start_story_creates_character_and_story() {
    let user_id = UserId::new();

    let mut characters = MockCharacterRepo::new();
    characters.expect_create().times(1).returning(|_| Ok(()));
    let mut items = MockItemRepo::new();
    items.expect_create().times(3).returning(|_| Ok(()));
    let mut skills = MockSkillRepo::new();
    skills.expect_create().times(7).returning(|_| Ok(()));

    let mut stories = MockStoryRepo::new();
    stories
        .expect_create()
        .withf(|story| {
            story.progress.len() == 1 && story.last_response.story_text == "You arrive at dusk."
        })
        .times(1)
        .returning(|_| Ok(()));

    let mut llm = MockLlmPort::new();
    llm.expect_generate().returning(|_| {
        Ok(LlmResponse {
            content: r#"{"story_text": "You arrive at dusk.", "choices": [{"id": "choice_1", "text": "Enter the village"}]}"#.to_string(),
            usage: None,
        })
    });

    let mut turn_writer = MockTurnWriter::new();
    // No deltas in the opening response, nothing to apply.
    turn_writer.expect_apply_turn().never();

    let use_case = StartStory::new(
        character_ops(characters, items, skills),
        Arc::new(stories),
        Arc::new(turn_writer),
        Arc::new(llm),
        catalog(),
        Arc::new(SystemClock),
    );

    let started = use_case
        .execute(user_id, "Brannic", "male")
        .await
        .expect("start succeeds");
    assert_eq!(started.response.story_text, "You arrive at dusk.");
}

#[tokio::test]
async fn test_start_story_rejects_bad_name() {
    let mut characters = MockCharacterRepo::new();
    characters.expect_create().never();

    let use_case = StartStory::new(
        character_ops(characters, MockItemRepo::new(), MockSkillRepo::new()),
        Arc::new(MockStoryRepo::new()),
        Arc::new(MockTurnWriter::new()),
        Arc::new(MockLlmPort::new()),
        catalog(),
        Arc::new(SystemClock),
    );

    let result = use_case.execute(UserId::new(), "Ab", "male").await;
    assert!(matches!(result, Err(TurnError::Invalid(_))));
}

fn chunked(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

struct StreamFixture {
    use_case: ContinueStoryStream,
    leases: TurnLeases,
    character_id: CharacterId,
    story_id: taleforge_domain::StoryId,
    user_id: UserId,
}

fn stream_fixture(
    llm_text: &str,
    turn_writer: MockTurnWriter,
) -> StreamFixture {
    let user_id = UserId::new();
    let character = make_character(user_id);
    let character_id = character.id;
    let story = make_story(user_id, character.id);
    let story_id = story.id;

    let mut stories = MockStoryRepo::new();
    let story_clone = story.clone();
    stories
        .expect_get()
        .returning(move |_, _| Ok(Some(story_clone.clone())));
    let mut characters = MockCharacterRepo::new();
    let character_clone = character.clone();
    characters
        .expect_get()
        .returning(move |_, _| Ok(Some(character_clone.clone())));
    let mut items = MockItemRepo::new();
    items
        .expect_list_for_character()
        .returning(|_| Ok(Vec::new()));
    let mut skills = MockSkillRepo::new();
    skills
        .expect_list_for_character()
        .returning(|_| Ok(Vec::new()));

    let mut llm = MockLlmPort::new();
    let fragments = chunked(llm_text, 7);
    llm.expect_generate_stream().returning(move |_| {
        let fragments = fragments.clone();
        let stream: crate::infrastructure::ports::TokenStream =
            Box::pin(futures_util::stream::iter(fragments.into_iter().map(Ok)));
        Ok(stream)
    });

    let leases = TurnLeases::new();
    let use_case = ContinueStoryStream::new(
        Arc::new(stories),
        Arc::new(characters),
        Arc::new(items),
        Arc::new(skills),
        Arc::new(turn_writer),
        Arc::new(llm),
        catalog(),
        leases.clone(),
    );

    StreamFixture {
        use_case,
        leases,
        character_id,
        story_id,
        user_id,
    }
}

async fn wait_for_lease_release(leases: &TurnLeases, character_id: CharacterId) {
    for _ in 0..100 {
        if let Some(lease) = leases.try_acquire(character_id) {
            drop(lease);
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("turn lease was never released");
}

#[tokio::test]
async fn test_stream_turn_forwards_story_text_and_persists() {
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let done_tx = Mutex::new(Some(done_tx));

    let mut turn_writer = MockTurnWriter::new();
    turn_writer
        .expect_apply_turn()
        .withf(|write| {
            write.mutations == vec![Mutation::SetStats(StatBlock::new(70, Some(100)))]
                && write.last_response.story_text == "The wolf lunges."
        })
        .times(1)
        .returning(move |_| {
            if let Some(tx) = done_tx.lock().expect("lock").take() {
                let _ = tx.send(());
            }
            Ok(())
        });

    let fixture = stream_fixture(wolf_turn_json(), turn_writer);

    let stream = fixture
        .use_case
        .execute(fixture.user_id, fixture.story_id, "Fight the wolf")
        .await
        .expect("stream starts");

    // The client sees the narrative text, not the raw JSON.
    let mut receiver = stream.receiver;
    let mut seen = String::new();
    while let Some(fragment) = receiver.recv().await {
        seen.push_str(&fragment);
    }
    assert_eq!(seen, "The wolf lunges.");

    // Background persistence completes without the client waiting on it.
    tokio::time::timeout(Duration::from_secs(5), done_rx)
        .await
        .expect("persistence finished")
        .expect("signal");

    wait_for_lease_release(&fixture.leases, fixture.character_id).await;
}

#[tokio::test]
async fn test_stream_persistence_failure_is_swallowed() {
    let mut turn_writer = MockTurnWriter::new();
    // Garbage text never parses, so nothing is ever applied.
    turn_writer.expect_apply_turn().never();

    let fixture = stream_fixture("The model rambles outside of JSON.", turn_writer);

    let stream = fixture
        .use_case
        .execute(fixture.user_id, fixture.story_id, "Fight")
        .await
        .expect("stream starts");

    let mut receiver = stream.receiver;
    let mut seen = String::new();
    while let Some(fragment) = receiver.recv().await {
        seen.push_str(&fragment);
    }
    // No story_text field ever appears, so the client gets nothing.
    assert!(seen.is_empty());

    // The lease is still released after the failed background persist.
    wait_for_lease_release(&fixture.leases, fixture.character_id).await;
}
