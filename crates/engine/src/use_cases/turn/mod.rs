//! Turn orchestration - the per-turn control flow around the reconciler.
//!
//! Both entry points share the same shape: build a context snapshot, call
//! the model, strict-parse the JSON, reconcile against the pre-mutation
//! snapshot, persist the mutation set atomically. The streaming variant
//! decouples the player-visible stream from background persistence.

mod continue_story;
mod partial;
mod start;
mod stream;

#[cfg(test)]
mod tests;

pub use continue_story::ContinueStory;
pub use partial::extract_story_text;
pub use start::{StartStory, StartedStory};
pub use stream::{ContinueStoryStream, StoryStream};

use taleforge_domain::{
    Character, CharacterItem, CharacterSkill, CharacterSnapshot, DomainError, ProgressEntry,
    Story, StoryResponse,
};

use crate::infrastructure::ports::{ChatMessage, LlmError, LlmRequest, RepoError};
use crate::llm_context::TurnContext;
use crate::use_cases::characters::CharacterError;

// Sampling parameters for story generation.
const TEMPERATURE: f32 = 0.6;
const MAX_TOKENS: u32 = 4500;
const PRESENCE_PENALTY: f32 = 0.3;
const FREQUENCY_PENALTY: f32 = 0.3;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Story not found")]
    NotFound,
    #[error("A turn is already in progress for this character")]
    TurnInProgress,
    #[error(transparent)]
    Invalid(DomainError),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Failed to parse AI response: {0}")]
    Parse(String),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<CharacterError> for TurnError {
    fn from(error: CharacterError) -> Self {
        match error {
            CharacterError::NotFound => TurnError::NotFound,
            CharacterError::Invalid(domain) => TurnError::Invalid(domain),
            CharacterError::Repo(repo) => TurnError::Repo(repo),
        }
    }
}

/// One request to the game master, with the fixed story sampling knobs.
fn story_request(system_prompt: String, context: &TurnContext) -> LlmRequest {
    LlmRequest::new(vec![ChatMessage::user(context.to_user_message())])
        .with_system_prompt(system_prompt)
        .with_temperature(TEMPERATURE)
        .with_max_tokens(MAX_TOKENS)
        .with_penalties(PRESENCE_PENALTY, FREQUENCY_PENALTY)
}

/// Strict parse; the raw text is logged on failure for diagnosis.
fn parse_story_response(raw: &str) -> Result<StoryResponse, TurnError> {
    StoryResponse::from_json_str(raw).map_err(|e| {
        tracing::error!(raw_response = %raw, error = %e, "Failed to parse AI response");
        TurnError::Parse(e.to_string())
    })
}

/// Everything a continuation turn computes before calling the model.
struct PreparedTurn {
    context: TurnContext,
    /// Progress log including the entry for the input being answered.
    progress: Vec<ProgressEntry>,
    snapshot: CharacterSnapshot,
}

fn prepare_continuation(
    story: &Story,
    character: &Character,
    items: Vec<CharacterItem>,
    skills: Vec<CharacterSkill>,
    user_input: &str,
) -> PreparedTurn {
    let mut progress = story.progress.clone();
    progress.push(ProgressEntry::with_input(
        story.last_response.clone(),
        user_input,
    ));

    let active_enemies = if story.last_response.has_active_enemies() {
        story.last_response.enemies.clone()
    } else {
        None
    };

    let context = TurnContext::next_turn(
        character,
        &items,
        &skills,
        active_enemies.as_deref(),
        &progress,
        user_input,
    );

    let snapshot = CharacterSnapshot {
        stats: character.stats.clone(),
        currency: character.currency,
        items,
        skills,
    };

    PreparedTurn {
        context,
        progress,
        snapshot,
    }
}
