//! Continue a story (streaming): the model's output is teed into a
//! player-visible stream and a background persistence task.
//!
//! The two consumers are fully decoupled. The display path scans the
//! accumulated text for `story_text` and forwards new fragments the moment
//! they arrive; it never waits for the full response. The persistence path
//! accumulates everything, then runs the same parse -> reconcile -> apply
//! pipeline as the buffered turn. A client disconnect stops neither the
//! generation nor the persistence; a persistence failure is logged only,
//! since the player-visible stream has already completed.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;

use taleforge_domain::{
    reconcile, CharacterId, CharacterSnapshot, GameCatalog, InventoryPolicy, ProgressEntry,
    StoryId, UserId,
};

use crate::infrastructure::ports::{
    CharacterRepo, ItemRepo, LlmPort, SkillRepo, StoryRepo, TurnWrite, TurnWriter,
};
use crate::infrastructure::state::{TurnLease, TurnLeases};
use crate::prompt_templates::build_system_prompt;

use super::{parse_story_response, prepare_continuation, story_request, TurnError};

/// Channel capacity for the fan-out and client channels.
const CHANNEL_CAPACITY: usize = 64;

pub struct ContinueStoryStream {
    stories: Arc<dyn StoryRepo>,
    characters: Arc<dyn CharacterRepo>,
    items: Arc<dyn ItemRepo>,
    skills: Arc<dyn SkillRepo>,
    turn_writer: Arc<dyn TurnWriter>,
    llm: Arc<dyn LlmPort>,
    catalog: Arc<GameCatalog>,
    leases: TurnLeases,
}

/// The player-visible side of a streamed turn: narrative fragments in
/// arrival order.
pub struct StoryStream {
    pub receiver: mpsc::Receiver<String>,
}

impl ContinueStoryStream {
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
    ) -> Result<StoryStream, TurnError> {
        let story = self
            .stories
            .get(story_id, user_id)
            .await?
            .ok_or(TurnError::NotFound)?;

        let lease = self
            .leases
            .try_acquire(story.character_id)
            .ok_or(TurnError::TurnInProgress)?;

        let character = self
            .characters
            .get(story.character_id, user_id)
            .await?
            .ok_or(TurnError::NotFound)?;
        let character_id = character.id;
        let items = self.items.list_for_character(character_id).await?;
        let skills = self.skills.list_for_character(character_id).await?;

        let prepared = prepare_continuation(&story, &character, items, skills, user_input);
        let request = story_request(build_system_prompt(&self.catalog), &prepared.context);

        let mut token_stream = self.llm.generate_stream(request).await?;

        let (display_tx, display_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (persist_tx, persist_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
        let (client_tx, client_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

        // Producer: fan each model fragment out to both consumers.
        tokio::spawn(async move {
            while let Some(next) = token_stream.next().await {
                match next {
                    Ok(fragment) => {
                        let _ = display_tx.send(fragment.clone()).await;
                        let _ = persist_tx.send(fragment).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "LLM stream failed mid-turn");
                        break;
                    }
                }
            }
        });

        // Display consumer: progressive story_text extraction for the client.
        tokio::spawn(forward_story_text(display_rx, client_tx));

        // Persistence consumer: accumulate, then parse/reconcile/apply.
        // The turn lease rides along and is released when this finishes.
        tokio::spawn(persist_when_complete(PersistTask {
            turn_writer: self.turn_writer.clone(),
            catalog: self.catalog.clone(),
            snapshot: prepared.snapshot,
            progress: prepared.progress,
            story_id,
            character_id,
            receiver: persist_rx,
            lease,
        }));

        Ok(StoryStream {
            receiver: client_rx,
        })
    }
}

/// Scan accumulated text and forward each new piece of `story_text`.
///
/// Keeps draining even when the client is gone so the producer never
/// blocks on a full channel.
async fn forward_story_text(
    mut receiver: mpsc::Receiver<String>,
    client_tx: mpsc::Sender<String>,
) {
    let mut accumulated = String::new();
    let mut sent_len = 0usize;

    while let Some(fragment) = receiver.recv().await {
        accumulated.push_str(&fragment);
        if let Some(story_text) = super::extract_story_text(&accumulated) {
            if story_text.len() > sent_len {
                let new_piece = story_text[sent_len..].to_string();
                sent_len = story_text.len();
                let _ = client_tx.send(new_piece).await;
            }
        }
    }
}

struct PersistTask {
    turn_writer: Arc<dyn TurnWriter>,
    catalog: Arc<GameCatalog>,
    snapshot: CharacterSnapshot,
    progress: Vec<ProgressEntry>,
    story_id: StoryId,
    character_id: CharacterId,
    receiver: mpsc::Receiver<String>,
    lease: TurnLease,
}

async fn persist_when_complete(task: PersistTask) {
    let PersistTask {
        turn_writer,
        catalog,
        snapshot,
        mut progress,
        story_id,
        character_id,
        mut receiver,
        lease: _lease,
    } = task;

    let mut full_text = String::new();
    while let Some(fragment) = receiver.recv().await {
        full_text.push_str(&fragment);
    }

    let result = async {
        let response = parse_story_response(&full_text)?;
        let reconciliation = reconcile(
            &catalog,
            &snapshot,
            &response,
            InventoryPolicy::AlwaysAppend,
        );
        if !reconciliation.warnings.is_empty() {
            tracing::warn!(
                story_id = %story_id,
                warnings = ?reconciliation.warnings,
                "Streamed turn reconciled with corrections"
            );
        }

        progress.push(ProgressEntry::new(reconciliation.sanitized.clone()));
        turn_writer
            .apply_turn(TurnWrite {
                story_id,
                character_id,
                mutations: reconciliation.mutations,
                progress,
                last_response: reconciliation.sanitized,
            })
            .await?;
        Ok::<(), TurnError>(())
    }
    .await;

    // The client stream has already completed; there is nobody to surface
    // this to. The story simply stays on its previous turn.
    if let Err(e) = result {
        tracing::error!(
            error = %e,
            story_id = %story_id,
            character_id = %character_id,
            "Failed to persist streamed turn"
        );
    }
}
