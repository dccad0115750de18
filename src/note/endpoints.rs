//! Route handlers for notes.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::UserID,
    extract::ApiJson,
    note::{NoteFields, NoteId, create_note, delete_note, get_notes, update_note},
};

/// The state needed for the note endpoints.
#[derive(Debug, Clone)]
pub struct NoteState {
    /// The database connection for managing notes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NoteState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or editing a note.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteData {
    /// The heading of the note.
    pub title: String,
    /// The body of the note.
    #[serde(default)]
    pub content: String,
    /// A CSS color.
    #[serde(default)]
    pub color: String,
}

impl From<NoteData> for NoteFields {
    fn from(data: NoteData) -> Self {
        Self {
            title: data.title,
            content: data.content,
            color: data.color,
        }
    }
}

/// Handler for listing the user's notes, most recently edited first.
pub async fn get_notes_endpoint(
    State(state): State<NoteState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_notes(user_id, &connection) {
        Ok(notes) => Json(notes).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for creating a note.
pub async fn create_note_endpoint(
    State(state): State<NoteState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<NoteData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_note(user_id, data.into(), &connection) {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for editing a note.
pub async fn update_note_endpoint(
    Path(note_id): Path<NoteId>,
    State(state): State<NoteState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<NoteData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_note(user_id, note_id, data.into(), &connection) {
        Ok(note) => Json(note).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Handler for deleting a note.
pub async fn delete_note_endpoint(
    Path(note_id): Path<NoteId>,
    State(state): State<NoteState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_note(user_id, note_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_response(),
    }
}
