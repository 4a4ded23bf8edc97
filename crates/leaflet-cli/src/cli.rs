use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use leaflet_core::sync::SyncDirection;

#[derive(Parser)]
#[command(name = "leaflet")]
#[command(about = "Local-first notes with two-way cloud sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the JSON client config
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Act as this user id (overrides the configured user)
    #[arg(long, global = true, value_name = "ID")]
    pub user_id: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work with notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Work with folders
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Exchange changes with the sync server
    Sync {
        #[arg(long, value_enum, default_value_t = DirectionArg::Both)]
        direction: DirectionArg,
    },
    /// Answer JSON requests from stdin, one per line
    Serve,
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Create a note, or update it when --id is given
    Save {
        #[arg(long)]
        title: String,
        /// Existing note id
        #[arg(long, value_name = "ID")]
        id: Option<String>,
        /// Folder id (root folder when omitted)
        #[arg(long, value_name = "ID")]
        folder: Option<String>,
        /// Editor payload as JSON
        #[arg(long, value_name = "JSON")]
        content: Option<String>,
        #[arg(long, value_name = "VERSION")]
        editor_version: Option<String>,
    },
    /// Show one note
    Get {
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a note
    Delete { id: String },
    /// List notes in a folder
    List {
        /// Folder id (root folder when omitted)
        #[arg(long, value_name = "ID")]
        folder: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder, or update it when --id is given
    Save {
        #[arg(long, value_name = "ID")]
        id: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// Show one folder
    Get { id: String },
    /// Delete a folder and the notes inside it
    Delete { id: String },
    /// Invite someone to a folder by email
    Invite {
        folder_id: String,
        email: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DirectionArg {
    Push,
    Pull,
    Both,
}

impl From<DirectionArg> for SyncDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Push => Self::Push,
            DirectionArg::Pull => Self::Pull,
            DirectionArg::Both => Self::Both,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
