//! Application state and composition.

use std::sync::Arc;

use taleforge_domain::GameCatalog;

use crate::infrastructure::persistence::SqliteRepositories;
use crate::infrastructure::ports::{ClockPort, LlmPort, StoryRepo};
use crate::infrastructure::state::TurnLeases;
use crate::use_cases::{CharacterOps, ContinueStory, ContinueStoryStream, StartStory};

/// Main application state.
///
/// Holds the catalog, the story read port, and the use cases.
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub catalog: Arc<GameCatalog>,
    pub stories: Arc<dyn StoryRepo>,
    pub use_cases: UseCases,
}

pub struct UseCases {
    pub characters: Arc<CharacterOps>,
    pub start_story: Arc<StartStory>,
    pub continue_story: Arc<ContinueStory>,
    pub continue_story_stream: Arc<ContinueStoryStream>,
}

impl App {
    pub fn new(
        repos: SqliteRepositories,
        llm: Arc<dyn LlmPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let catalog = Arc::new(GameCatalog::standard());
        let leases = TurnLeases::new();

        let characters = Arc::new(CharacterOps::new(
            repos.characters.clone(),
            repos.items.clone(),
            repos.skills.clone(),
            clock.clone(),
        ));

        let start_story = Arc::new(StartStory::new(
            characters.clone(),
            repos.stories.clone(),
            repos.turn_writer.clone(),
            llm.clone(),
            catalog.clone(),
            clock,
        ));

        let continue_story = Arc::new(ContinueStory::new(
            repos.stories.clone(),
            repos.characters.clone(),
            repos.items.clone(),
            repos.skills.clone(),
            repos.turn_writer.clone(),
            llm.clone(),
            catalog.clone(),
            leases.clone(),
        ));

        let continue_story_stream = Arc::new(ContinueStoryStream::new(
            repos.stories.clone(),
            repos.characters.clone(),
            repos.items.clone(),
            repos.skills.clone(),
            repos.turn_writer.clone(),
            llm,
            catalog.clone(),
            leases,
        ));

        Self {
            catalog,
            stories: repos.stories,
            use_cases: UseCases {
                characters,
                start_story,
                continue_story,
                continue_story_stream,
            },
        }
    }
}
