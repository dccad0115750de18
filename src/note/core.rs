//! Defines the note model and its database queries.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, auth::UserID, database_id::DatabaseId};

/// Database identifier for a note.
pub type NoteId = DatabaseId;

/// The background color used when a note is saved without one.
pub const DEFAULT_NOTE_COLOR: &str = "#ffffff";

/// A free-form note kept by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// The ID of the note.
    pub id: NoteId,
    /// The user that wrote the note.
    pub user_id: UserID,
    /// The heading of the note, never empty.
    pub title: String,
    /// The body of the note.
    pub content: String,
    /// A CSS color.
    pub color: String,
    /// When the note was written.
    pub created_at: OffsetDateTime,
    /// When the note was last edited.
    pub updated_at: OffsetDateTime,
}

/// The user editable fields of a note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteFields {
    /// The heading of the note.
    pub title: String,
    /// The body of the note.
    pub content: String,
    /// A CSS color, the default color is used when empty.
    pub color: String,
}

impl NoteFields {
    fn validate(mut self) -> Result<Self, Error> {
        self.title = self.title.trim().to_owned();

        if self.title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        if self.color.trim().is_empty() {
            DEFAULT_NOTE_COLOR.clone_into(&mut self.color);
        }

        Ok(self)
    }
}

/// Create the note table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_note_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS note (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL DEFAULT '#ffffff',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_note_user_updated ON note(user_id, updated_at);",
    )
}

/// Create a note written by `user_id`.
///
/// # Errors
/// Returns [Error::EmptyTitle] if the title is empty, or an error if there is an SQL error.
pub fn create_note(user_id: UserID, fields: NoteFields, connection: &Connection) -> Result<Note, Error> {
    let fields = fields.validate()?;
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO note (user_id, title, content, color, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING id, user_id, title, content, color, created_at, updated_at",
        )?
        .query_row(
            params![user_id.as_i64(), fields.title, fields.content, fields.color, now],
            map_note_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the user's notes, most recently edited first.
pub fn get_notes(user_id: UserID, connection: &Connection) -> Result<Vec<Note>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, title, content, color, created_at, updated_at FROM note
             WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_note_row)?
        .map(|maybe_note| maybe_note.map_err(Error::from))
        .collect()
}

/// Replace the contents of a note and mark it as edited now.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTitle] if the title is empty,
/// - [Error::UpdateMissingNote] if the user has no note with `id`.
pub fn update_note(
    user_id: UserID,
    id: NoteId,
    fields: NoteFields,
    connection: &Connection,
) -> Result<Note, Error> {
    let fields = fields.validate()?;

    connection
        .prepare(
            "UPDATE note SET title = ?1, content = ?2, color = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING id, user_id, title, content, color, created_at, updated_at",
        )?
        .query_row(
            params![
                fields.title,
                fields.content,
                fields.color,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64()
            ],
            map_note_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingNote,
            error => error.into(),
        })
}

/// Delete a note written by `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingNote] if the user has no note with `id`.
pub fn delete_note(user_id: UserID, id: NoteId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM note WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingNote);
    }

    Ok(())
}

fn map_note_row(row: &Row) -> Result<Note, rusqlite::Error> {
    Ok(Note {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        title: row.get(2)?,
        content: row.get(3)?,
        color: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
