//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::{
    domain::{
        ActiveView, Flashcard, FlashcardSet, InputKind, ItemKind, KnowledgeBase, LoadedItem, Note,
        Summary,
    },
    ports::PortError,
};
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_knowledge_base_handler,
        create_summary_handler,
        get_summary_handler,
        create_flashcards_handler,
        save_note_handler,
        load_item_handler,
    ),
    components(
        schemas(
            SummarizeRequest,
            SaveNoteRequest,
            SummaryResponse,
            FlashcardResponse,
            FlashcardSetResponse,
            NoteResponse,
            KnowledgeBaseResponse,
            LoadedItemResponse,
            InputType,
            ActiveViewName,
        )
    ),
    tags(
        (name = "Study Assistant API", description = "Summaries, flashcards and notes for a study session.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Url,
    Text,
}

impl From<InputType> for InputKind {
    fn from(value: InputType) -> Self {
        match value {
            InputType::Url => InputKind::Url,
            InputType::Text => InputKind::Text,
        }
    }
}

impl From<InputKind> for InputType {
    fn from(value: InputKind) -> Self {
        match value {
            InputKind::Url => InputType::Url,
            InputKind::Text => InputType::Text,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActiveViewName {
    Summary,
    Chat,
    Flashcards,
    Notes,
}

impl From<ActiveView> for ActiveViewName {
    fn from(value: ActiveView) -> Self {
        match value {
            ActiveView::Summary => ActiveViewName::Summary,
            ActiveView::Chat => ActiveViewName::Chat,
            ActiveView::Flashcards => ActiveViewName::Flashcards,
            ActiveView::Notes => ActiveViewName::Notes,
        }
    }
}

/// The payload for summarizing a URL or a block of text.
#[derive(Deserialize, ToSchema)]
pub struct SummarizeRequest {
    #[serde(rename = "type")]
    pub kind: InputType,
    pub content: String,
}

/// The payload for saving the note attached to a summary.
#[derive(Deserialize, ToSchema)]
pub struct SaveNoteRequest {
    pub content: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: InputType,
}

impl From<Summary> for SummaryResponse {
    fn from(s: Summary) -> Self {
        Self {
            id: s.id,
            title: s.title,
            content: s.content,
            source: s.source,
            kind: s.kind.into(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct FlashcardResponse {
    pub front: String,
    pub back: String,
}

impl From<Flashcard> for FlashcardResponse {
    fn from(c: Flashcard) -> Self {
        Self {
            front: c.front,
            back: c.back,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSetResponse {
    pub id: String,
    pub summary_id: String,
    pub title: String,
    pub cards: Vec<FlashcardResponse>,
}

impl From<FlashcardSet> for FlashcardSetResponse {
    fn from(f: FlashcardSet) -> Self {
        Self {
            id: f.id,
            summary_id: f.summary_id,
            title: f.title,
            cards: f.cards.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: String,
    pub summary_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            summary_id: n.summary_id,
            title: n.title,
            content: n.content,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

/// Every item of the session, most recent first.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct KnowledgeBaseResponse {
    pub summaries: Vec<SummaryResponse>,
    pub flashcards: Vec<FlashcardSetResponse>,
    pub notes: Vec<NoteResponse>,
}

impl From<KnowledgeBase> for KnowledgeBaseResponse {
    fn from(kb: KnowledgeBase) -> Self {
        Self {
            summaries: kb.summaries.into_iter().map(Into::into).collect(),
            flashcards: kb.flashcard_sets.into_iter().map(Into::into).collect(),
            notes: kb.notes.into_iter().map(Into::into).collect(),
        }
    }
}

/// What the client should make active after reopening an item.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadedItemResponse {
    pub summary: Option<SummaryResponse>,
    pub flashcards: Vec<FlashcardResponse>,
    pub note: Option<NoteResponse>,
    pub active_view: ActiveViewName,
}

impl From<LoadedItem> for LoadedItemResponse {
    fn from(item: LoadedItem) -> Self {
        Self {
            summary: item.summary.map(Into::into),
            flashcards: item.flashcards.into_iter().map(Into::into).collect(),
            note: item.note.map(Into::into),
            active_view: item.view.into(),
        }
    }
}

/// Maps a port failure onto an HTTP status and a message for the user.
pub fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {}", what)),
        PortError::InvalidInput(why) => (StatusCode::BAD_REQUEST, why),
        PortError::Generation(message) => (StatusCode::BAD_GATEWAY, message),
        PortError::Unexpected(details) => {
            error!("Unexpected error while handling request: {}", details);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List everything accumulated in this session.
#[utoipa::path(
    get,
    path = "/knowledge-base",
    responses(
        (status = 200, description = "The knowledge base", body = KnowledgeBaseResponse)
    )
)]
pub async fn get_knowledge_base_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<KnowledgeBaseResponse> {
    Json(app_state.study.knowledge_base().await.into())
}

/// Summarize a URL or a block of text.
#[utoipa::path(
    post,
    path = "/summaries",
    request_body = SummarizeRequest,
    responses(
        (status = 201, description = "Summary created", body = SummaryResponse),
        (status = 400, description = "Empty content"),
        (status = 502, description = "The AI provider failed")
    )
)]
pub async fn create_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SummarizeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let summary = app_state
        .study
        .summarize(payload.kind.into(), &payload.content)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(SummaryResponse::from(summary))))
}

/// Fetch one summary.
#[utoipa::path(
    get,
    path = "/summaries/{id}",
    params(("id" = String, Path, description = "The summary id")),
    responses(
        (status = 200, description = "The summary", body = SummaryResponse),
        (status = 404, description = "No such summary")
    )
)]
pub async fn get_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, (StatusCode, String)> {
    app_state
        .study
        .find_summary(&id)
        .await
        .map(|s| Json(s.into()))
        .ok_or_else(|| port_error_response(PortError::NotFound(format!("summary {}", id))))
}

/// Generate a new flashcard set from a summary.
#[utoipa::path(
    post,
    path = "/summaries/{id}/flashcards",
    params(("id" = String, Path, description = "The summary id")),
    responses(
        (status = 201, description = "Flashcard set created", body = FlashcardSetResponse),
        (status = 404, description = "No such summary"),
        (status = 502, description = "The AI provider failed")
    )
)]
pub async fn create_flashcards_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let set = app_state
        .study
        .generate_flashcards(&id)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(FlashcardSetResponse::from(set))))
}

/// Create or update the note attached to a summary.
#[utoipa::path(
    put,
    path = "/summaries/{id}/note",
    request_body = SaveNoteRequest,
    params(("id" = String, Path, description = "The summary id")),
    responses(
        (status = 200, description = "The saved note", body = NoteResponse),
        (status = 400, description = "Blank note content"),
        (status = 404, description = "No such summary")
    )
)]
pub async fn save_note_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<SaveNoteRequest>,
) -> Result<Json<NoteResponse>, (StatusCode, String)> {
    let note = app_state
        .study
        .save_note(&id, &payload.content)
        .await
        .map_err(port_error_response)?;
    Ok(Json(note.into()))
}

/// Reopen a summary, flashcard set or note from the knowledge base.
#[utoipa::path(
    get,
    path = "/items/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "One of `summary`, `flashcards`, `note`"),
        ("id" = String, Path, description = "The item id")
    ),
    responses(
        (status = 200, description = "What becomes active", body = LoadedItemResponse),
        (status = 400, description = "Unknown item kind"),
        (status = 404, description = "No such item")
    )
)]
pub async fn load_item_handler(
    State(app_state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<LoadedItemResponse>, (StatusCode, String)> {
    let kind = kind.parse::<ItemKind>().map_err(|e| {
        warn!("Rejected item lookup: {}", e);
        (StatusCode::BAD_REQUEST, e)
    })?;
    let loaded = app_state
        .study
        .load_item(kind, &id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(loaded.into()))
}
