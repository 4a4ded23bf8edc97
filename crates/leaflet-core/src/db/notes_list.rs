//! Notes of one folder, for display

use serde_json::Value;

use super::document::from_document;
use super::{Collection, DocumentStore, Query};
use crate::error::Result;
use crate::models::{DocId, Note};

/// Read-only listing of the notes in a folder, or in the root when the
/// folder is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesList {
    folder_id: Option<DocId>,
}

impl NotesList {
    pub const fn new(folder_id: Option<DocId>) -> Self {
        Self { folder_id }
    }

    pub const fn is_root(&self) -> bool {
        self.folder_id.is_none()
    }

    /// Notes whose `folderId` matches; root matches null or missing only.
    /// Order is the store's and carries no meaning.
    pub async fn get(&self, store: &DocumentStore) -> Result<Vec<Note>> {
        let folder = self
            .folder_id
            .as_ref()
            .map_or(Value::Null, |id| Value::from(id.as_str()));

        store
            .find(Collection::Notes, &Query::all().eq("folderId", folder))
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }
}
