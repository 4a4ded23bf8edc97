use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use leaflet_core::config::ClientConfig;
use leaflet_core::handlers::{Handlers, Request, Response};
use leaflet_core::models::User;
use leaflet_core::sync::{HttpCloudClient, SyncDirection};
use leaflet_core::{DocumentStore, Session};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::cli::{Cli, Commands, CompletionShell, DirectionArg, NoteCommands};
use crate::commands::common::{
    format_relative_time, parse_content, parse_id, resolve_db_path, resolve_session,
    title_preview, AppContext,
};
use crate::commands::completions::{completion_script, run_completions};
use crate::commands::folder::run_folder;
use crate::commands::note::run_note;
use crate::commands::serve::serve;
use crate::commands::sync::run_sync;
use crate::error::CliError;

async fn app() -> AppContext {
    let store = DocumentStore::open_in_memory().await.unwrap();
    AppContext::with_store(store, &ClientConfig::default(), Some("u1".into())).unwrap()
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_nested_commands_and_globals() {
    let cli = Cli::try_parse_from([
        "leaflet",
        "note",
        "save",
        "--title",
        "Hello",
        "--folder",
        "f1",
        "--db-path",
        "/tmp/x.db",
    ])
    .unwrap();

    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
    let Commands::Note {
        command: NoteCommands::Save { title, folder, .. },
    } = cli.command
    else {
        panic!("expected note save");
    };
    assert_eq!(title, "Hello");
    assert_eq!(folder.as_deref(), Some("f1"));

    let cli = Cli::try_parse_from(["leaflet", "sync", "--direction", "pull"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Sync {
            direction: DirectionArg::Pull
        }
    ));
    assert_eq!(SyncDirection::from(DirectionArg::Pull), SyncDirection::Pull);
}

#[test]
fn explicit_db_path_wins() {
    let config = ClientConfig {
        database_path: Some(PathBuf::from("/from/config.db")),
        ..ClientConfig::default()
    };
    assert_eq!(
        resolve_db_path(Some(PathBuf::from("/from/flag.db")), &config),
        PathBuf::from("/from/flag.db")
    );
}

#[test]
fn session_prefers_flag_over_configured_user() {
    let config = ClientConfig {
        user: Some(User {
            id: "configured".into(),
            name: Some("Ada".into()),
            email: None,
        }),
        ..ClientConfig::default()
    };

    assert_eq!(
        resolve_session(Some("flag".into()), &config).actor_id(),
        Some("flag")
    );
    assert_eq!(
        resolve_session(Some("  ".into()), &config).actor_id(),
        Some("configured")
    );
    assert_eq!(
        resolve_session(None, &ClientConfig::default()),
        Session::anonymous()
    );
}

#[test]
fn parse_content_defaults_and_validates() {
    assert_eq!(parse_content(None).unwrap(), json!([]));
    assert_eq!(
        parse_content(Some(r#"[{"type":"paragraph"}]"#)).unwrap(),
        json!([{"type": "paragraph"}])
    );
    assert!(matches!(
        parse_content(Some("{not json")),
        Err(CliError::InvalidContent(_))
    ));
    assert!(matches!(parse_id("  "), Err(CliError::InvalidId(_))));
}

#[test]
fn title_preview_truncates_and_names_untitled() {
    assert_eq!(title_preview("  ", 10), "(untitled)");
    assert_eq!(title_preview("a   b", 10), "a b");
    assert_eq!(title_preview("abcdefghijkl", 8), "abcde...");
}

#[test]
fn relative_time_buckets() {
    let now = 10 * 24 * 3_600_000;
    assert_eq!(format_relative_time(now - 1_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3h ago");
    assert_eq!(format_relative_time(now - 2 * 86_400_000, now), "2d ago");
    assert_eq!(format_relative_time(0, now), "1970-01-01 00:00:00 UTC");
}

#[test]
fn completion_script_names_binary() {
    let script = String::from_utf8(completion_script(CompletionShell::Bash)).unwrap();
    assert!(script.contains("leaflet"));
}

#[test]
fn run_completions_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaflet.fish");
    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    assert!(std::fs::read_to_string(path).unwrap().contains("leaflet"));
}

#[tokio::test(flavor = "multi_thread")]
async fn note_commands_round_trip_through_handlers() {
    let app = app().await;

    run_note(
        NoteCommands::Save {
            title: "Plan".into(),
            id: None,
            folder: None,
            content: Some(r#"[{"type":"paragraph","data":{"text":"hi"}}]"#.into()),
            editor_version: Some("2.0".into()),
        },
        &app,
    )
    .await
    .unwrap();

    let Response::NotesList { notes, .. } = app
        .dispatch(Request::LoadNotesList { folder_id: None })
        .await
        .unwrap()
    else {
        panic!("expected notes list");
    };
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].author_id.as_deref(), Some("u1"));

    run_note(
        NoteCommands::Delete {
            id: notes[0].id.to_string(),
        },
        &app,
    )
    .await
    .unwrap();
    let missing = run_note(
        NoteCommands::Get {
            id: notes[0].id.to_string(),
            json: true,
        },
        &app,
    )
    .await;
    assert!(matches!(missing, Err(CliError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn folder_invite_requires_existing_folder() {
    let app = app().await;
    let result = run_folder(
        crate::cli::FolderCommands::Invite {
            folder_id: "nope".into(),
            email: "bob@example.com".into(),
        },
        &app,
    )
    .await;

    assert!(matches!(
        result,
        Err(CliError::Request { ref event, .. }) if event == "folder - invite"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_requires_configuration() {
    let app = app().await;
    let result = run_sync(SyncDirection::Both, &app).await;
    assert!(matches!(result, Err(CliError::SyncNotConfigured)));
}

#[tokio::test(flavor = "multi_thread")]
async fn serve_answers_each_line() {
    let store = DocumentStore::open_in_memory().await.unwrap();
    let handlers = Handlers::<HttpCloudClient>::new(store, Session::anonymous(), None);

    let input = concat!(
        r#"{"event":"note - save","note":{"folderId":null,"title":"Hi","data":{"items":[]}}}"#,
        "\n\n",
        r#"{"event":"notes list - load","folderId":null}"#,
        "\n",
        "not json\n",
        r#"{"event":"user - sync"}"#,
        "\n",
    );
    let mut output = Vec::new();

    let handled = serve(&handlers, input.as_bytes(), &mut output)
        .await
        .unwrap();
    assert_eq!(handled, 4);

    let responses = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(responses[0]["event"], "note saved");
    assert_eq!(responses[0]["isRootFolder"], true);
    assert_eq!(responses[1]["event"], "update notes list");
    assert_eq!(responses[1]["notes"][0]["title"], "Hi");
    assert_eq!(responses[2]["event"], "failed");
    assert_eq!(responses[2]["request"], "");
    assert_eq!(responses[3]["event"], "sync finished");
    assert_eq!(responses[3]["result"], false);
}
