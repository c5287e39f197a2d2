//! Continue a story (buffered): one request, one sanitized response.

use std::sync::Arc;

use taleforge_domain::{
    reconcile, GameCatalog, InventoryPolicy, ProgressEntry, StoryId, StoryResponse, UserId,
};

use crate::infrastructure::ports::{
    CharacterRepo, ItemRepo, LlmPort, SkillRepo, StoryRepo, TurnWrite, TurnWriter,
};
use crate::infrastructure::state::TurnLeases;
use crate::prompt_templates::build_system_prompt;

use super::{parse_story_response, prepare_continuation, story_request, TurnError};

pub struct ContinueStory {
    stories: Arc<dyn StoryRepo>,
    characters: Arc<dyn CharacterRepo>,
    items: Arc<dyn ItemRepo>,
    skills: Arc<dyn SkillRepo>,
    turn_writer: Arc<dyn TurnWriter>,
    llm: Arc<dyn LlmPort>,
    catalog: Arc<GameCatalog>,
    leases: TurnLeases,
}

impl ContinueStory {
    pub fn new(
        stories: Arc<dyn StoryRepo>,
        characters: Arc<dyn CharacterRepo>,
        items: Arc<dyn ItemRepo>,
        skills: Arc<dyn SkillRepo>,
        turn_writer: Arc<dyn TurnWriter>,
        llm: Arc<dyn LlmPort>,
        catalog: Arc<GameCatalog>,
        leases: TurnLeases,
    ) -> Self {
        Self {
            stories,
            characters,
            items,
            skills,
            turn_writer,
            llm,
            catalog,
            leases,
        }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        story_id: StoryId,
        user_input: &str,
    ) -> Result<StoryResponse, TurnError> {
        let story = self
            .stories
            .get(story_id, user_id)
            .await?
            .ok_or(TurnError::NotFound)?;

        // Held through persistence; a second turn for this character fails
        // fast instead of racing.
        let _lease = self
            .leases
            .try_acquire(story.character_id)
            .ok_or(TurnError::TurnInProgress)?;

        let character = self
            .characters
            .get(story.character_id, user_id)
            .await?
            .ok_or(TurnError::NotFound)?;
        let items = self.items.list_for_character(character.id).await?;
        let skills = self.skills.list_for_character(character.id).await?;

        let prepared = prepare_continuation(&story, &character, items, skills, user_input);
        let request = story_request(build_system_prompt(&self.catalog), &prepared.context);

        let raw = self.llm.generate(request).await?.content;
        let response = parse_story_response(&raw)?;

        let reconciliation = reconcile(
            &self.catalog,
            &prepared.snapshot,
            &response,
            InventoryPolicy::AlwaysAppend,
        );
        if !reconciliation.warnings.is_empty() {
            tracing::warn!(
                story_id = %story_id,
                warnings = ?reconciliation.warnings,
                "Turn reconciled with corrections"
            );
        }

        let mut progress = prepared.progress;
        progress.push(ProgressEntry::new(reconciliation.sanitized.clone()));

        self.turn_writer
            .apply_turn(TurnWrite {
                story_id,
                character_id: character.id,
                mutations: reconciliation.mutations,
                progress,
                last_response: reconciliation.sanitized.clone(),
            })
            .await?;

        Ok(reconciliation.sanitized)
    }
}
