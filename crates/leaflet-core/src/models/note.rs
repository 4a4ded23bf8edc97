//! Note model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{blank_id_as_none, null_to_default, DocId};

/// A persisted note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store identity (local or remote-assigned)
    pub id: DocId,
    /// Note title
    #[serde(default, deserialize_with = "null_to_default")]
    pub title: String,
    /// Version of the editor that produced `content`
    #[serde(default)]
    pub editor_version: Option<String>,
    /// Last modification timestamp (Unix ms)
    #[serde(default)]
    pub dt_modify: i64,
    /// Author's user id; `None` when nobody was signed in
    #[serde(default)]
    pub author_id: Option<String>,
    /// Owning folder; `None` means the root folder
    #[serde(default, deserialize_with = "blank_id_as_none")]
    pub folder_id: Option<DocId>,
    /// Opaque editor payload
    #[serde(default)]
    pub content: Value,
}

impl Note {
    /// Whether the note lives in the root folder
    pub const fn is_in_root(&self) -> bool {
        self.folder_id.is_none()
    }
}

/// Caller-supplied fields for saving a note.
///
/// `title` is required; everything else is optional. The modification stamp
/// and the author are decided at save time, never by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    id: Option<DocId>,
    title: String,
    editor_version: Option<String>,
    folder_id: Option<DocId>,
    content: Value,
}

impl NoteDraft {
    /// Start a draft for a new note with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            editor_version: None,
            folder_id: None,
            content: Value::Null,
        }
    }

    /// Target an existing (or remote-assigned) identity
    #[must_use]
    pub fn with_id(mut self, id: Option<DocId>) -> Self {
        self.id = id;
        self
    }

    /// Place the note in a folder (`None` for the root)
    #[must_use]
    pub fn in_folder(mut self, folder_id: Option<DocId>) -> Self {
        self.folder_id = folder_id;
        self
    }

    #[must_use]
    pub fn editor_version(mut self, version: Option<String>) -> Self {
        self.editor_version = version;
        self
    }

    #[must_use]
    pub fn content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    pub const fn id(&self) -> Option<&DocId> {
        self.id.as_ref()
    }

    /// Store body for this draft, without identity
    pub(crate) fn body(&self, dt_modify: i64, author_id: Option<&str>) -> Value {
        json!({
            "title": self.title,
            "editorVersion": self.editor_version,
            "dtModify": dt_modify,
            "authorId": author_id,
            "folderId": self.folder_id,
            "content": self.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn draft_body_uses_store_field_names() {
        let draft = NoteDraft::new("A")
            .editor_version(Some("2.1".into()))
            .content(json!({"items": "x"}));
        let body = draft.body(42, Some("user-1"));

        assert_eq!(
            body,
            json!({
                "title": "A",
                "editorVersion": "2.1",
                "dtModify": 42,
                "authorId": "user-1",
                "folderId": null,
                "content": {"items": "x"},
            })
        );
    }

    #[test]
    fn deserialize_treats_blank_folder_as_root() {
        let note: Note = serde_json::from_value(json!({
            "id": "n1",
            "title": null,
            "dtModify": 5,
            "folderId": "",
        }))
        .unwrap();

        assert!(note.is_in_root());
        assert_eq!(note.title, "");
        assert_eq!(note.content, Value::Null);
    }
}
