//! Collaborator repository

use super::document::{from_document, into_document, to_document, ID_FIELD};
use super::note_repository::first_document;
use super::{Collection, DocumentStore, Query, Update, UpdateOptions};
use crate::error::Result;
use crate::models::{Collaborator, CollaboratorDraft, DocId};
use crate::sync::reconcile::{apply_remote_document, Reconcile};
use crate::util::Clock;

/// Field holding an invitation's timestamp
pub const COLLABORATOR_STAMP_FIELD: &str = "dtInvite";

/// Invitation operations over the `COLLABORATORS` collection
pub struct CollaboratorRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> CollaboratorRepository<'a> {
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Save an invitation.
    ///
    /// - no id: created on this client, insert under a fresh identity
    /// - id unknown to the store: arrived from the remote, insert keeping it
    /// - id known: update every non-id field of the stored document
    ///
    /// The store does not enforce one invitation per `(folder, email)`;
    /// check [`Self::find_by_email`] first.
    pub async fn save(&self, draft: CollaboratorDraft) -> Result<Collaborator> {
        let mut body = into_document(draft.body(Clock::now()))?;

        let Some(id) = draft.id() else {
            let inserted = self.store.insert(Collection::Collaborators, body).await?;
            return from_document(inserted);
        };

        let existing = self
            .store
            .find_one(Collection::Collaborators, &Query::by_id(id))
            .await?;

        if existing.is_none() {
            body.insert(ID_FIELD.to_string(), id.as_str().into());
            let inserted = self.store.insert(Collection::Collaborators, body).await?;
            return from_document(inserted);
        }

        let outcome = self
            .store
            .update(
                Collection::Collaborators,
                &Query::by_id(id),
                Update::Set(body),
                UpdateOptions {
                    return_updated_docs: true,
                    ..UpdateOptions::default()
                },
            )
            .await?;
        from_document(first_document(outcome.affected_documents, id)?)
    }

    /// Invitation for `email` to `folder_id`, if one exists
    pub async fn find_by_email(
        &self,
        folder_id: &DocId,
        email: &str,
    ) -> Result<Option<Collaborator>> {
        let email = crate::models::normalize_email(email)?;
        self.store
            .find_one(
                Collection::Collaborators,
                &Query::all()
                    .eq("folderId", folder_id.as_str())
                    .eq("email", email),
            )
            .await?
            .map(from_document)
            .transpose()
    }

    /// Invitations made strictly after `since` (Unix ms)
    pub async fn prepare_updates(&self, since: i64) -> Result<Vec<Collaborator>> {
        self.store
            .find(
                Collection::Collaborators,
                &Query::all().gt(COLLABORATOR_STAMP_FIELD, since),
            )
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Apply an invitation received from the remote, keeping its timestamp.
    pub async fn apply_remote(
        &self,
        collaborator: &Collaborator,
        previous_id: Option<&DocId>,
    ) -> Result<Reconcile> {
        apply_remote_document(
            self.store,
            Collection::Collaborators,
            to_document(collaborator)?,
            COLLABORATOR_STAMP_FIELD,
            previous_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn setup() -> DocumentStore {
        DocumentStore::open_in_memory().await.unwrap()
    }

    fn folder() -> DocId {
        "folder-1".parse().unwrap()
    }

    fn draft(email: &str) -> CollaboratorDraft {
        CollaboratorDraft::new(folder(), email).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_without_id_assigns_new_identity() {
        let store = setup().await;
        let repo = CollaboratorRepository::new(&store);

        let saved = repo.save(draft("ada@example.com")).await.unwrap();
        assert_eq!(saved.folder_id, folder());
        assert!(saved.dt_invite > 0);
        assert!(!saved.token.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_with_unknown_id_preserves_it() {
        let store = setup().await;
        let repo = CollaboratorRepository::new(&store);
        let id: DocId = "cloud-invite".parse().unwrap();

        let saved = repo
            .save(draft("ada@example.com").with_id(Some(id.clone())))
            .await
            .unwrap();
        assert_eq!(saved.id, id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_with_known_id_updates_fields_only() {
        let store = setup().await;
        let repo = CollaboratorRepository::new(&store);

        let created = repo
            .save(draft("ada@example.com").token(Some("first".into())))
            .await
            .unwrap();
        let updated = repo
            .save(
                CollaboratorDraft::from(created.clone())
                    .token(Some("second".into())),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.token, "second");
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.dt_invite, created.dt_invite);
        let all = store
            .find(Collection::Collaborators, &Query::all())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn find_by_email_matches_folder_and_address() {
        let store = setup().await;
        let repo = CollaboratorRepository::new(&store);
        repo.save(draft("ada@example.com")).await.unwrap();

        assert!(repo
            .find_by_email(&folder(), "Ada@Example.com")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_by_email(&"other".parse().unwrap(), "ada@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn prepare_updates_uses_invite_time() {
        let store = setup().await;
        let repo = CollaboratorRepository::new(&store);

        repo.save(draft("old@example.com").invited_at(Some(100)))
            .await
            .unwrap();
        repo.save(draft("new@example.com").invited_at(Some(200)))
            .await
            .unwrap();

        let updates = repo.prepare_updates(100).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].email, "new@example.com");
    }
}
