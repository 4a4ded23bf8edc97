use super::{FolderInput, Response};
use crate::db::{DocumentStore, FolderRepository};
use crate::error::Result;
use crate::models::{DocId, FolderDraft, Session};

/// Handles the `folder - *` events
pub struct FolderController {
    store: DocumentStore,
    session: Session,
}

impl FolderController {
    pub const fn new(store: DocumentStore, session: Session) -> Self {
        Self { store, session }
    }

    /// Save a folder from `{id, title}`.
    ///
    /// Renaming a known folder keeps its owner and note summaries; a new
    /// folder is owned by the session's user.
    pub async fn save_folder(&self, input: FolderInput) -> Result<Response> {
        let repo = FolderRepository::new(&self.store);
        let existing = match &input.id {
            Some(id) => repo.get(id).await?,
            None => None,
        };
        let actor = self.session.actor_id().map(ToString::to_string);
        let draft = match existing {
            Some(existing) => FolderDraft::new(input.title)
                .with_id(Some(existing.id))
                .owner(existing.owner_id.or(actor))
                .notes(existing.notes),
            None => FolderDraft::new(input.title).with_id(input.id).owner(actor),
        };
        let folder = repo.save(draft).await?;
        tracing::info!("Saved folder {}", folder.id);
        Ok(Response::FolderSaved { folder })
    }

    pub async fn get_folder(&self, id: &DocId) -> Result<Response> {
        let folder = FolderRepository::new(&self.store).get(id).await?;
        Ok(Response::Folder { folder })
    }

    pub async fn delete_folder(&self, id: &DocId) -> Result<Response> {
        let result = FolderRepository::new(&self.store).delete(id).await?;
        tracing::info!(
            "Deleted folder {id}: {} note(s) removed",
            result.notes_removed
        );
        Ok(Response::FolderDeleted { result })
    }

    pub async fn invite(&self, folder_id: &DocId, email: &str) -> Result<Response> {
        let collaborator = FolderRepository::new(&self.store)
            .add_collaborator(folder_id, email, &self.session)
            .await?;
        Ok(Response::Invited { collaborator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FolderDeletion, NoteRepository};
    use crate::models::{NoteDraft, User};
    use pretty_assertions::assert_eq;

    fn owner() -> Session {
        Session::signed_in(User {
            id: "owner-1".into(),
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
        })
    }

    async fn saved_folder(folders: &FolderController) -> crate::models::Folder {
        let response = folders
            .save_folder(FolderInput {
                id: None,
                title: Some("Projects".into()),
            })
            .await
            .unwrap();
        let Response::FolderSaved { folder } = response else {
            panic!("expected folder saved");
        };
        folder
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_sets_owner_from_session() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        let folders = FolderController::new(store, owner());

        let folder = saved_folder(&folders).await;
        assert_eq!(folder.owner_id.as_deref(), Some("owner-1"));
        assert_eq!(
            folders.get_folder(&folder.id).await.unwrap(),
            Response::Folder {
                folder: Some(folder)
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_removes_folder_and_its_notes() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        let folders = FolderController::new(store.clone(), owner());
        let folder = saved_folder(&folders).await;
        NoteRepository::new(&store)
            .save(
                NoteDraft::new("inside").in_folder(Some(folder.id.clone())),
                &owner(),
            )
            .await
            .unwrap();

        assert_eq!(
            folders.delete_folder(&folder.id).await.unwrap(),
            Response::FolderDeleted {
                result: FolderDeletion {
                    notes_removed: 1,
                    folder_removed: true,
                }
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invite_reuses_pending_invitation() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        let folders = FolderController::new(store, owner());
        let folder = saved_folder(&folders).await;

        let Response::Invited { collaborator: first } = folders
            .invite(&folder.id, "bob@example.com")
            .await
            .unwrap()
        else {
            panic!("expected invitation");
        };
        let Response::Invited {
            collaborator: second,
        } = folders
            .invite(&folder.id, "BOB@example.com")
            .await
            .unwrap()
        else {
            panic!("expected invitation");
        };

        assert_eq!(first.id, second.id);
        assert_eq!(first.owner_id.as_deref(), Some("owner-1"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rename_keeps_owner_and_note_summaries() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        let summaries = vec![serde_json::json!({"id": "n1", "title": "inside"})];
        let original = FolderRepository::new(&store)
            .save(
                FolderDraft::new(Some("Projects".into()))
                    .owner(Some("owner-1".into()))
                    .notes(summaries.clone()),
            )
            .await
            .unwrap();

        let folders = FolderController::new(store, Session::anonymous());
        let Response::FolderSaved { folder } = folders
            .save_folder(FolderInput {
                id: Some(original.id.clone()),
                title: Some("Archive".into()),
            })
            .await
            .unwrap()
        else {
            panic!("expected folder saved");
        };

        assert_eq!(folder.id, original.id);
        assert_eq!(folder.title.as_deref(), Some("Archive"));
        assert_eq!(folder.owner_id.as_deref(), Some("owner-1"));
        assert_eq!(folder.notes, summaries);
        assert!(folder.dt_modify > original.dt_modify);
    }
}
