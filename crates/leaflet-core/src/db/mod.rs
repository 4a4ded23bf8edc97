//! Database layer for Leaflet

mod collaborator_repository;
mod connection;
pub mod document;
mod folder_repository;
mod migrations;
mod note_repository;
mod notes_list;
mod store;
mod sync_state_repository;

pub use collaborator_repository::{CollaboratorRepository, COLLABORATOR_STAMP_FIELD};
pub use connection::Database;
pub use folder_repository::{FolderDeletion, FolderRepository, FOLDER_STAMP_FIELD};
pub use note_repository::{NoteRepository, NOTE_STAMP_FIELD};
pub use notes_list::NotesList;
pub use store::{
    Collection, DocumentStore, Query, RemoveOptions, Update, UpdateOptions, UpdateOutcome,
};
pub use sync_state_repository::{SyncStateRepository, Watermarks};
