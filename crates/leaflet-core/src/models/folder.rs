//! Folder model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{null_to_default, DocId};

/// A persisted folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Store identity (local or remote-assigned)
    pub id: DocId,
    #[serde(default)]
    pub title: Option<String>,
    /// Last modification timestamp (Unix ms)
    #[serde(default)]
    pub dt_modify: i64,
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Denormalized note summaries. Not authoritative: membership is
    /// `Note::folder_id == Folder::id`.
    #[serde(default, deserialize_with = "null_to_default")]
    pub notes: Vec<Value>,
}

/// Caller-supplied fields for saving a folder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderDraft {
    id: Option<DocId>,
    title: Option<String>,
    owner_id: Option<String>,
    notes: Vec<Value>,
}

impl FolderDraft {
    pub fn new(title: Option<String>) -> Self {
        Self {
            title,
            ..Self::default()
        }
    }

    /// Target an existing (or remote-assigned) identity
    #[must_use]
    pub fn with_id(mut self, id: Option<DocId>) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn owner(mut self, owner_id: Option<String>) -> Self {
        self.owner_id = owner_id;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Vec<Value>) -> Self {
        self.notes = notes;
        self
    }

    pub const fn id(&self) -> Option<&DocId> {
        self.id.as_ref()
    }

    pub(crate) fn body(&self, dt_modify: i64) -> Value {
        json!({
            "title": self.title,
            "ownerId": self.owner_id,
            "dtModify": dt_modify,
            "notes": self.notes,
        })
    }
}

impl From<Folder> for FolderDraft {
    fn from(folder: Folder) -> Self {
        Self {
            id: Some(folder.id),
            title: folder.title,
            owner_id: folder.owner_id,
            notes: folder.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_accepts_null_notes() {
        let folder: Folder = serde_json::from_value(json!({
            "id": "f1",
            "title": "Work",
            "dtModify": 10,
            "ownerId": null,
            "notes": null,
        }))
        .unwrap();

        assert!(folder.notes.is_empty());
        assert_eq!(folder.title.as_deref(), Some("Work"));
    }

    #[test]
    fn draft_from_folder_keeps_identity() {
        let folder = Folder {
            id: "f1".parse().unwrap(),
            title: Some("Work".into()),
            dt_modify: 1,
            owner_id: Some("u1".into()),
            notes: vec![],
        };
        let draft = FolderDraft::from(folder);
        assert_eq!(draft.id().map(DocId::as_str), Some("f1"));
    }
}
