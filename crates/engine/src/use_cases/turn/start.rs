//! Start a new story: create the character, play the opening turn.

use std::sync::Arc;

use taleforge_domain::{
    loadout, reconcile, CharacterId, CharacterSnapshot, GameCatalog, InventoryPolicy, Story,
    StoryId, StoryResponse, UserId,
};

use crate::infrastructure::ports::{ClockPort, LlmPort, StoryRepo, TurnWrite, TurnWriter};
use crate::llm_context::TurnContext;
use crate::prompt_templates::build_system_prompt;
use crate::use_cases::characters::CharacterOps;

use super::{parse_story_response, story_request, TurnError};

pub struct StartStory {
    characters: Arc<CharacterOps>,
    stories: Arc<dyn StoryRepo>,
    turn_writer: Arc<dyn TurnWriter>,
    llm: Arc<dyn LlmPort>,
    catalog: Arc<GameCatalog>,
    clock: Arc<dyn ClockPort>,
}

#[derive(Debug)]
pub struct StartedStory {
    pub story_id: StoryId,
    pub character_id: CharacterId,
    pub response: StoryResponse,
}

impl StartStory {
    pub fn new(
        characters: Arc<CharacterOps>,
        stories: Arc<dyn StoryRepo>,
        turn_writer: Arc<dyn TurnWriter>,
        llm: Arc<dyn LlmPort>,
        catalog: Arc<GameCatalog>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            characters,
            stories,
            turn_writer,
            llm,
            catalog,
            clock,
        }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        character_name: &str,
        gender: &str,
    ) -> Result<StartedStory, TurnError> {
        let created = self
            .characters
            .create_with_loadout(user_id, character_name, gender)
            .await?;
        let character = created.character;

        let initial_prompt = loadout::initial_story_prompt(&character.name, &character.gender);
        let context =
            TurnContext::initial(&character, &created.items, &created.skills, initial_prompt);
        let request = story_request(build_system_prompt(&self.catalog), &context);

        let raw = self.llm.generate(request).await?.content;
        let response = parse_story_response(&raw)?;

        let snapshot = CharacterSnapshot {
            stats: character.stats.clone(),
            currency: character.currency,
            items: created.items,
            skills: created.skills,
        };
        let reconciliation = reconcile(
            &self.catalog,
            &snapshot,
            &response,
            InventoryPolicy::AlwaysAppend,
        );
        if !reconciliation.warnings.is_empty() {
            tracing::warn!(
                character_id = %character.id,
                warnings = ?reconciliation.warnings,
                "Opening turn reconciled with corrections"
            );
        }

        let story = Story::new(
            user_id,
            character.id,
            format!("{}'s Adventure", character.name),
            reconciliation.sanitized.clone(),
            self.clock.now(),
        );
        self.stories.create(&story).await?;

        if !reconciliation.mutations.is_empty() {
            self.turn_writer
                .apply_turn(TurnWrite {
                    story_id: story.id,
                    character_id: character.id,
                    mutations: reconciliation.mutations,
                    progress: story.progress.clone(),
                    last_response: story.last_response.clone(),
                })
                .await?;
        }

        tracing::info!(story_id = %story.id, character_id = %character.id, "Started story");
        Ok(StartedStory {
            story_id: story.id,
            character_id: character.id,
            response: reconciliation.sanitized,
        })
    }
}
