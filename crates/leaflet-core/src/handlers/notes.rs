use super::{NoteInput, Response};
use crate::db::{DocumentStore, NoteRepository, NotesList};
use crate::error::Result;
use crate::models::{DocId, NoteDraft, Session};

/// Handles `note - save`, `notes list - load`, `get note` and `delete note`
pub struct NotesController {
    store: DocumentStore,
    session: Session,
}

impl NotesController {
    pub const fn new(store: DocumentStore, session: Session) -> Self {
        Self { store, session }
    }

    pub async fn save_note(&self, input: NoteInput) -> Result<Response> {
        let is_root_folder = input.folder_id.is_none();
        let draft = NoteDraft::new(input.title)
            .with_id(input.data.id)
            .in_folder(input.folder_id)
            .editor_version(input.data.version)
            .content(input.data.items);

        let note = NoteRepository::new(&self.store)
            .save(draft, &self.session)
            .await?;
        tracing::info!("Saved note {}", note.id);
        Ok(Response::NoteSaved {
            note,
            is_root_folder,
        })
    }

    pub async fn load_notes_list(&self, folder_id: Option<DocId>) -> Result<Response> {
        let list = NotesList::new(folder_id);
        let notes = list.get(&self.store).await?;
        Ok(Response::NotesList {
            notes,
            is_root_folder: list.is_root(),
        })
    }

    pub async fn get_note(&self, id: &DocId) -> Result<Response> {
        let note = NoteRepository::new(&self.store).get(id).await?;
        Ok(Response::Note { note })
    }

    pub async fn delete_note(&self, id: &DocId) -> Result<Response> {
        let result = NoteRepository::new(&self.store).delete(id).await?;
        Ok(Response::NoteDeleted { result })
    }
}
