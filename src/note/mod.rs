//! Free-form notes.

mod core;
mod endpoints;

pub use core::{
    NoteFields, NoteId, create_note, create_note_table, delete_note, get_notes, update_note,
};
pub use endpoints::{
    create_note_endpoint, delete_note_endpoint, get_notes_endpoint, update_note_endpoint,
};
