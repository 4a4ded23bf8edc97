use leaflet_core::handlers::{FolderInput, Request, Response};

use crate::cli::FolderCommands;
use crate::commands::common::{parse_id, parse_optional_id, print_json, AppContext};
use crate::error::CliError;

pub async fn run_folder(command: FolderCommands, app: &AppContext) -> Result<(), CliError> {
    match command {
        FolderCommands::Save { id, title } => {
            let folder = FolderInput {
                id: parse_optional_id(id.as_deref())?,
                title,
            };
            if let Response::FolderSaved { folder } =
                app.dispatch(Request::SaveFolder { folder }).await?
            {
                println!("{}", folder.id);
            }
        }
        FolderCommands::Get { id } => {
            let id = parse_id(&id)?;
            let Response::Folder {
                folder: Some(folder),
            } = app.dispatch(Request::GetFolder { id: id.clone() }).await?
            else {
                return Err(CliError::NotFound(format!("folder {id}")));
            };
            print_json(&folder)?;
        }
        FolderCommands::Delete { id } => {
            let id = parse_id(&id)?;
            if let Response::FolderDeleted { result } =
                app.dispatch(Request::DeleteFolder { id: id.clone() }).await?
            {
                if !result.folder_removed {
                    return Err(CliError::NotFound(format!("folder {id}")));
                }
                println!("{id} ({} note(s) removed)", result.notes_removed);
            }
        }
        FolderCommands::Invite { folder_id, email } => {
            let folder_id = parse_id(&folder_id)?;
            if let Response::Invited { collaborator } = app
                .dispatch(Request::InviteToFolder { folder_id, email })
                .await?
            {
                println!("{} {}", collaborator.email, collaborator.token);
            }
        }
    }
    Ok(())
}
