//! Request handlers.
//!
//! Front ends send [`Request`]s tagged by their `event` name and get a
//! [`Response`] back. Failures are logged here and turned into a `failed`
//! response; they never travel further.

mod folders;
mod notes;
mod user;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DocumentStore, FolderDeletion};
use crate::models::{blank_id_as_none, Collaborator, DocId, Folder, Note, Session, User};
use crate::sync::{CloudExchange, SyncDirection, SyncReport};

pub use folders::FolderController;
pub use notes::NotesController;
pub use user::UserController;

/// Note payload as sent by the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInput {
    /// `None` for the root folder
    #[serde(default, deserialize_with = "blank_id_as_none")]
    pub folder_id: Option<DocId>,
    pub title: String,
    pub data: EditorData,
}

/// Editor output for one note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorData {
    /// Set when editing an existing note
    #[serde(default, deserialize_with = "blank_id_as_none")]
    pub id: Option<DocId>,
    #[serde(default)]
    pub items: Value,
    #[serde(default)]
    pub version: Option<String>,
    /// Editor-side save time; informational only
    #[serde(default)]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderInput {
    #[serde(default, deserialize_with = "blank_id_as_none")]
    pub id: Option<DocId>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Request {
    #[serde(rename = "note - save")]
    SaveNote { note: NoteInput },
    #[serde(rename = "notes list - load")]
    LoadNotesList {
        #[serde(
            default,
            rename = "folderId",
            deserialize_with = "blank_id_as_none"
        )]
        folder_id: Option<DocId>,
    },
    #[serde(rename = "get note")]
    GetNote { id: DocId },
    #[serde(rename = "delete note")]
    DeleteNote { id: DocId },
    #[serde(rename = "folder - save")]
    SaveFolder { folder: FolderInput },
    #[serde(rename = "folder - get")]
    GetFolder { id: DocId },
    #[serde(rename = "folder - delete")]
    DeleteFolder { id: DocId },
    #[serde(rename = "folder - invite")]
    InviteToFolder {
        #[serde(rename = "folderId")]
        folder_id: DocId,
        email: String,
    },
    #[serde(rename = "user - get")]
    GetUser,
    #[serde(rename = "user - sync")]
    Sync {
        #[serde(default)]
        direction: SyncDirection,
    },
}

impl Request {
    /// Wire name of the event
    pub const fn event(&self) -> &'static str {
        match self {
            Self::SaveNote { .. } => "note - save",
            Self::LoadNotesList { .. } => "notes list - load",
            Self::GetNote { .. } => "get note",
            Self::DeleteNote { .. } => "delete note",
            Self::SaveFolder { .. } => "folder - save",
            Self::GetFolder { .. } => "folder - get",
            Self::DeleteFolder { .. } => "folder - delete",
            Self::InviteToFolder { .. } => "folder - invite",
            Self::GetUser => "user - get",
            Self::Sync { .. } => "user - sync",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum Response {
    #[serde(rename = "note saved", rename_all = "camelCase")]
    NoteSaved { note: Note, is_root_folder: bool },
    #[serde(rename = "update notes list", rename_all = "camelCase")]
    NotesList {
        notes: Vec<Note>,
        is_root_folder: bool,
    },
    #[serde(rename = "note")]
    Note {
        #[serde(serialize_with = "none_as_false")]
        note: Option<Note>,
    },
    #[serde(rename = "note deleted")]
    NoteDeleted { result: bool },
    #[serde(rename = "folder saved")]
    FolderSaved { folder: Folder },
    #[serde(rename = "folder")]
    Folder {
        #[serde(serialize_with = "none_as_false")]
        folder: Option<Folder>,
    },
    #[serde(rename = "folder deleted")]
    FolderDeleted { result: FolderDeletion },
    #[serde(rename = "collaborator invited")]
    Invited { collaborator: Collaborator },
    #[serde(rename = "user")]
    User { user: Option<User> },
    #[serde(rename = "sync finished")]
    SyncFinished {
        result: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<SyncReport>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// `request` names the event that failed
    #[serde(rename = "failed")]
    Failed { request: String, error: String },
}

impl Response {
    /// Whether the caller should treat this as success
    pub const fn is_success(&self) -> bool {
        !matches!(
            self,
            Self::Failed { .. } | Self::SyncFinished { result: false, .. }
        )
    }

    fn failed(event: &str, error: &crate::Error) -> Self {
        Self::Failed {
            request: event.to_string(),
            error: error.to_string(),
        }
    }
}

fn none_as_false<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: serde::Serializer,
{
    match value {
        Some(value) => value.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}

/// Routes requests to the controllers
pub struct Handlers<C> {
    notes: NotesController,
    folders: FolderController,
    user: UserController<C>,
}

impl<C: CloudExchange> Handlers<C> {
    pub fn new(store: DocumentStore, session: Session, cloud: Option<C>) -> Self {
        Self {
            notes: NotesController::new(store.clone(), session.clone()),
            folders: FolderController::new(store.clone(), session.clone()),
            user: UserController::new(store, session, cloud),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let event = request.event();
        let outcome = match request {
            Request::SaveNote { note } => self.notes.save_note(note).await,
            Request::LoadNotesList { folder_id } => self.notes.load_notes_list(folder_id).await,
            Request::GetNote { id } => self.notes.get_note(&id).await,
            Request::DeleteNote { id } => self.notes.delete_note(&id).await,
            Request::SaveFolder { folder } => self.folders.save_folder(folder).await,
            Request::GetFolder { id } => self.folders.get_folder(&id).await,
            Request::DeleteFolder { id } => self.folders.delete_folder(&id).await,
            Request::InviteToFolder { folder_id, email } => {
                self.folders.invite(&folder_id, &email).await
            }
            Request::GetUser => Ok(self.user.get()),
            Request::Sync { direction } => Ok(self.user.sync(direction).await),
        };

        outcome.unwrap_or_else(|error| {
            if error.is_validation() {
                tracing::warn!("{event} rejected: {error}");
            } else {
                tracing::error!("{event} failed: {error}");
            }
            Response::failed(event, &error)
        })
    }

    /// Decode one JSON request and handle it; undecodable input becomes a
    /// `failed` response.
    pub async fn handle_json(&self, payload: &str) -> Response {
        match serde_json::from_str::<Request>(payload) {
            Ok(request) => self.handle(request).await,
            Err(error) => {
                tracing::warn!("Undecodable request: {error}");
                Response::Failed {
                    request: request_event_name(payload).unwrap_or_default(),
                    error: format!("invalid request: {error}"),
                }
            }
        }
    }
}

fn request_event_name(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    value.get("event")?.as_str().map(ToString::to_string)
}
