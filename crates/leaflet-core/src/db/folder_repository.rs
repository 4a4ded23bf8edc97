//! Folder repository

use serde::Serialize;
use serde_json::Value;

use super::collaborator_repository::CollaboratorRepository;
use super::document::{from_document, into_document, to_document, Document, ID_FIELD};
use super::note_repository::first_document;
use super::{Collection, DocumentStore, Query, RemoveOptions, Update, UpdateOptions};
use crate::error::{Error, Result};
use crate::models::{Collaborator, CollaboratorDraft, DocId, Folder, FolderDraft, Session};
use crate::sync::reconcile::{apply_remote_document, Reconcile};
use crate::util::Clock;

/// Field holding a folder's modification stamp
pub const FOLDER_STAMP_FIELD: &str = "dtModify";

/// Result of deleting a folder together with its notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDeletion {
    pub notes_removed: u64,
    pub folder_removed: bool,
}

/// Folder operations over the `DIRECTORY` collection
pub struct FolderRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> FolderRepository<'a> {
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Upsert a folder by id.
    ///
    /// A draft id (local or remote-assigned) is forced into the stored
    /// document so the record keeps that identity. Without one, the store
    /// assigns a new identity, which the returned folder carries.
    pub async fn save(&self, draft: FolderDraft) -> Result<Folder> {
        let mut body = into_document(draft.body(Clock::now()))?;
        let query = match draft.id() {
            Some(id) => {
                body.insert(ID_FIELD.to_string(), id.as_str().into());
                Query::by_id(id)
            }
            None => Query::all().eq(ID_FIELD, Value::Null),
        };

        let outcome = self
            .store
            .update(
                Collection::Directory,
                &query,
                Update::Replace(body),
                UpdateOptions {
                    upsert: true,
                    return_updated_docs: true,
                    multi: false,
                },
            )
            .await?;

        let id = outcome
            .id
            .ok_or_else(|| Error::Database("folder upsert reported no identity".into()))?;
        let folder: Folder = from_document(first_document(outcome.affected_documents, &id)?)?;
        tracing::debug!("Saved folder {} (dtModify {})", folder.id, folder.dt_modify);
        Ok(folder)
    }

    pub async fn get(&self, id: &DocId) -> Result<Option<Folder>> {
        self.store
            .find_one(Collection::Directory, &Query::by_id(id))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Delete a folder and every note inside it.
    ///
    /// Notes go first. If removing them fails the folder is left in place and
    /// the error is returned, so a retry can finish the job.
    pub async fn delete(&self, id: &DocId) -> Result<FolderDeletion> {
        let notes_removed = self
            .store
            .remove(
                Collection::Notes,
                &Query::all().eq("folderId", id.as_str()),
                RemoveOptions { multi: true },
            )
            .await?;

        let folder_removed = self
            .store
            .remove(Collection::Directory, &Query::by_id(id), RemoveOptions::default())
            .await?
            > 0;

        tracing::info!("Deleted folder {id}: {notes_removed} note(s) removed");
        Ok(FolderDeletion {
            notes_removed,
            folder_removed,
        })
    }

    /// Folders modified strictly after `since` (Unix ms)
    pub async fn get_updates(&self, since: i64) -> Result<Vec<Folder>> {
        self.store
            .find(
                Collection::Directory,
                &Query::all().gt(FOLDER_STAMP_FIELD, since),
            )
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Invite `email` to a folder, reusing a pending invitation for the same
    /// address.
    pub async fn add_collaborator(
        &self,
        folder_id: &DocId,
        email: &str,
        session: &Session,
    ) -> Result<Collaborator> {
        let owner = session
            .actor_id()
            .ok_or_else(|| Error::InvalidInput("sign in to share a folder".into()))?;
        if self.get(folder_id).await?.is_none() {
            return Err(Error::NotFound(format!("folder {folder_id}")));
        }

        let collaborators = CollaboratorRepository::new(self.store);
        if let Some(existing) = collaborators.find_by_email(folder_id, email).await? {
            tracing::debug!("Invitation for {} already pending", existing.email);
            return Ok(existing);
        }

        let draft = CollaboratorDraft::new(folder_id.clone(), email)?.owner(Some(owner.to_string()));
        let invited = collaborators.save(draft).await?;
        tracing::info!("Invited {} to folder {folder_id}", invited.email);
        Ok(invited)
    }

    /// Apply a folder received from the remote, keeping its timestamp.
    ///
    /// When the remote re-keyed a folder this client created, notes and
    /// invitations pointing at the old id follow it to the new one.
    pub async fn apply_remote(
        &self,
        folder: &Folder,
        previous_id: Option<&DocId>,
    ) -> Result<Reconcile> {
        let decision = apply_remote_document(
            self.store,
            Collection::Directory,
            to_document(folder)?,
            FOLDER_STAMP_FIELD,
            previous_id,
        )
        .await?;

        if let Some(previous) = previous_id.filter(|previous| **previous != folder.id) {
            self.repoint_children(previous, &folder.id).await?;
        }
        Ok(decision)
    }

    async fn repoint_children(&self, from: &DocId, to: &DocId) -> Result<()> {
        let mut fields = Document::new();
        fields.insert("folderId".to_string(), to.as_str().into());

        for collection in [Collection::Notes, Collection::Collaborators] {
            let outcome = self
                .store
                .update(
                    collection,
                    &Query::all().eq("folderId", from.as_str()),
                    Update::Set(fields.clone()),
                    UpdateOptions {
                        multi: true,
                        ..UpdateOptions::default()
                    },
                )
                .await?;
            tracing::debug!(
                "Moved {} {} record(s) from folder {from} to {to}",
                outcome.num_affected,
                collection.table()
            );
        }
        Ok(())
    }
}
