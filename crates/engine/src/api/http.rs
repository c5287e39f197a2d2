//! HTTP routes.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taleforge_domain::{Character, CharacterId, Story, StoryId, StoryResponse, UserId};

use crate::app::App;
use crate::use_cases::{CharacterError, TurnError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/characters", get(list_characters))
        .route(
            "/api/characters/{id}",
            get(get_character).delete(delete_character),
        )
        .route("/api/stories", post(start_story))
        .route("/api/stories/{id}", get(get_story))
        .route("/api/stories/{id}/last", get(get_last_response))
        .route("/api/stories/{id}/continue", post(continue_story))
        .route(
            "/api/stories/{id}/continue-stream",
            post(continue_story_stream),
        )
}

async fn health() -> &'static str {
    "OK"
}

/// The acting user, from the opaque X-User-Id header the auth layer in
/// front of this service injects.
fn current_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<UserId>().ok())
        .ok_or(ApiError::Unauthorized)
}

// =============================================================================
// Characters
// =============================================================================

async fn list_characters(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Character>>, ApiError> {
    let user_id = current_user(&headers)?;
    let characters = app.use_cases.characters.list(user_id).await?;
    Ok(Json(characters))
}

async fn get_character(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Character>, ApiError> {
    let user_id = current_user(&headers)?;
    let character = app
        .use_cases
        .characters
        .get(CharacterId::from_uuid(id), user_id)
        .await?;
    Ok(Json(character))
}

async fn delete_character(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = current_user(&headers)?;
    app.use_cases
        .characters
        .delete(CharacterId::from_uuid(id), user_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// =============================================================================
// Stories
// =============================================================================

#[derive(Debug, Deserialize)]
struct StartStoryRequest {
    character_name: String,
    gender: String,
}

#[derive(Debug, Serialize)]
struct StartStoryResponse {
    story_id: StoryId,
    character_id: CharacterId,
    response: StoryResponse,
}

async fn start_story(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(body): Json<StartStoryRequest>,
) -> Result<Json<StartStoryResponse>, ApiError> {
    let user_id = current_user(&headers)?;
    let started = app
        .use_cases
        .start_story
        .execute(user_id, &body.character_name, &body.gender)
        .await?;
    Ok(Json(StartStoryResponse {
        story_id: started.story_id,
        character_id: started.character_id,
        response: started.response,
    }))
}

async fn get_story(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Story>, ApiError> {
    let user_id = current_user(&headers)?;
    let story = app
        .stories
        .get(StoryId::from_uuid(id), user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(story))
}

async fn get_last_response(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<StoryResponse>, ApiError> {
    let user_id = current_user(&headers)?;
    let response = app
        .stories
        .get_last_response(StoryId::from_uuid(id), user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct ContinueRequest {
    input: String,
}

async fn continue_story(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ContinueRequest>,
) -> Result<Json<StoryResponse>, ApiError> {
    let user_id = current_user(&headers)?;
    let response = app
        .use_cases
        .continue_story
        .execute(user_id, StoryId::from_uuid(id), &body.input)
        .await?;
    Ok(Json(response))
}

async fn continue_story_stream(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<ContinueRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let user_id = current_user(&headers)?;
    let story_stream = app
        .use_cases
        .continue_story_stream
        .execute(user_id, StoryId::from_uuid(id), &body.input)
        .await?;

    // The response completes when the display consumer closes the channel;
    // persistence keeps running in the background either way.
    let events = futures_util::stream::unfold(story_stream.receiver, |mut receiver| async move {
        receiver.recv().await.map(|fragment| {
            (
                Ok::<_, Infallible>(Event::default().data(fragment)),
                receiver,
            )
        })
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    Conflict(String),
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Unauthorized => {
                (axum::http::StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::Conflict(msg) => (axum::http::StatusCode::CONFLICT, msg).into_response(),
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                )
                    .into_response()
            }
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(error: TurnError) -> Self {
        match error {
            TurnError::NotFound => ApiError::NotFound,
            TurnError::TurnInProgress => ApiError::Conflict(error.to_string()),
            TurnError::Invalid(domain) => ApiError::BadRequest(domain.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CharacterError> for ApiError {
    fn from(error: CharacterError) -> Self {
        match error {
            CharacterError::NotFound => ApiError::NotFound,
            CharacterError::Invalid(domain) => ApiError::BadRequest(domain.to_string()),
            CharacterError::Repo(repo) => ApiError::Internal(repo.to_string()),
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(error: crate::infrastructure::ports::RepoError) -> Self {
        if error.is_not_found() {
            ApiError::NotFound
        } else {
            ApiError::Internal(error.to_string())
        }
    }
}
