//! Note repository

use super::document::{from_document, into_document, to_document, Document, ID_FIELD};
use super::{Collection, DocumentStore, Query, RemoveOptions, Update, UpdateOptions};
use crate::error::{Error, Result};
use crate::models::{DocId, Note, NoteDraft, Session};
use crate::sync::reconcile::{apply_remote_document, Reconcile};
use crate::util::Clock;

/// Field holding a note's modification stamp
pub const NOTE_STAMP_FIELD: &str = "dtModify";

/// Note operations over the `NOTES` collection
pub struct NoteRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> NoteRepository<'a> {
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Save a note.
    ///
    /// Without an id the note is inserted under a store-assigned identity.
    /// With an id it is updated in place, or inserted under that id when the
    /// store does not know it yet. `dtModify` is always stamped here and
    /// `authorId` comes from the session.
    pub async fn save(&self, draft: NoteDraft, session: &Session) -> Result<Note> {
        let mut body = into_document(draft.body(Clock::now(), session.actor_id()))?;

        let document = match draft.id() {
            None => self.store.insert(Collection::Notes, body).await?,
            Some(id) => {
                body.insert(ID_FIELD.to_string(), id.as_str().into());
                let outcome = self
                    .store
                    .update(
                        Collection::Notes,
                        &Query::by_id(id),
                        Update::Replace(body),
                        UpdateOptions {
                            upsert: true,
                            return_updated_docs: true,
                            multi: false,
                        },
                    )
                    .await?;
                first_document(outcome.affected_documents, id)?
            }
        };

        let note: Note = from_document(document)?;
        tracing::debug!("Saved note {} (dtModify {})", note.id, note.dt_modify);
        Ok(note)
    }

    /// Fetch a note by id; `None` when it does not exist
    pub async fn get(&self, id: &DocId) -> Result<Option<Note>> {
        self.store
            .find_one(Collection::Notes, &Query::by_id(id))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Remove a note; `false` when there was nothing to remove
    pub async fn delete(&self, id: &DocId) -> Result<bool> {
        let removed = self
            .store
            .remove(Collection::Notes, &Query::by_id(id), RemoveOptions::default())
            .await?;
        Ok(removed > 0)
    }

    /// Notes modified strictly after `since` (Unix ms)
    pub async fn get_updates(&self, since: i64) -> Result<Vec<Note>> {
        self.store
            .find(Collection::Notes, &Query::all().gt(NOTE_STAMP_FIELD, since))
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Apply a note received from the remote, keeping its timestamp.
    pub async fn apply_remote(&self, note: &Note, previous_id: Option<&DocId>) -> Result<Reconcile> {
        apply_remote_document(
            self.store,
            Collection::Notes,
            to_document(note)?,
            NOTE_STAMP_FIELD,
            previous_id,
        )
        .await
    }
}

pub(crate) fn first_document(documents: Vec<Document>, id: &DocId) -> Result<Document> {
    documents
        .into_iter()
        .next()
        .ok_or_else(|| Error::Database(format!("store returned no document for {id}")))
}
