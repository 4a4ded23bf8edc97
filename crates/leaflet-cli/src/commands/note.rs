use leaflet_core::handlers::{EditorData, NoteInput, Request, Response};

use crate::cli::NoteCommands;
use crate::commands::common::{
    format_note_lines, format_timestamp, parse_content, parse_id, parse_optional_id, print_json,
    AppContext,
};
use crate::error::CliError;

pub async fn run_note(command: NoteCommands, app: &AppContext) -> Result<(), CliError> {
    match command {
        NoteCommands::Save {
            title,
            id,
            folder,
            content,
            editor_version,
        } => {
            let input = NoteInput {
                folder_id: parse_optional_id(folder.as_deref())?,
                title,
                data: EditorData {
                    id: parse_optional_id(id.as_deref())?,
                    items: parse_content(content.as_deref())?,
                    version: editor_version,
                    time: None,
                },
            };
            if let Response::NoteSaved { note, .. } =
                app.dispatch(Request::SaveNote { note: input }).await?
            {
                println!("{}", note.id);
            }
        }
        NoteCommands::Get { id, json } => {
            let id = parse_id(&id)?;
            let Response::Note { note: Some(note) } =
                app.dispatch(Request::GetNote { id: id.clone() }).await?
            else {
                return Err(CliError::NotFound(format!("note {id}")));
            };

            if json {
                print_json(&note)?;
            } else {
                println!("{}", note.title);
                println!("id:       {}", note.id);
                println!(
                    "folder:   {}",
                    note.folder_id.as_ref().map_or("(root)", |id| id.as_str())
                );
                println!("modified: {}", format_timestamp(note.dt_modify));
                println!("{}", serde_json::to_string_pretty(&note.content)?);
            }
        }
        NoteCommands::Delete { id } => {
            let id = parse_id(&id)?;
            let response = app.dispatch(Request::DeleteNote { id: id.clone() }).await?;
            if response == (Response::NoteDeleted { result: false }) {
                return Err(CliError::NotFound(format!("note {id}")));
            }
            println!("{id}");
        }
        NoteCommands::List { folder, json } => {
            let folder_id = parse_optional_id(folder.as_deref())?;
            let Response::NotesList { notes, .. } =
                app.dispatch(Request::LoadNotesList { folder_id }).await?
            else {
                return Ok(());
            };

            if json {
                print_json(&notes)?;
            } else if notes.is_empty() {
                println!("No notes.");
            } else {
                for line in format_note_lines(&notes) {
                    println!("{line}");
                }
            }
        }
    }
    Ok(())
}
