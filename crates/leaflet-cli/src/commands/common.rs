use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use leaflet_core::config::ClientConfig;
use leaflet_core::handlers::{Handlers, Request, Response};
use leaflet_core::models::User;
use leaflet_core::sync::HttpCloudClient;
use leaflet_core::{DocId, DocumentStore, Note, Session};
use serde_json::Value;

use crate::error::CliError;

/// Everything a command needs: the request handlers over the local store
pub struct AppContext {
    handlers: Handlers<HttpCloudClient>,
    sync_configured: bool,
}

impl AppContext {
    pub async fn open(
        db_path: Option<PathBuf>,
        config_path: Option<PathBuf>,
        user_id: Option<String>,
    ) -> Result<Self, CliError> {
        let config = load_config(&resolve_config_path(config_path))?;
        let db_path = resolve_db_path(db_path, &config);
        tracing::debug!("Opening database at {}", db_path.display());
        let store = DocumentStore::open(&db_path).await?;
        Self::with_store(store, &config, user_id)
    }

    pub fn with_store(
        store: DocumentStore,
        config: &ClientConfig,
        user_id: Option<String>,
    ) -> Result<Self, CliError> {
        let cloud = if config.is_sync_configured() {
            Some(HttpCloudClient::from_config(config)?)
        } else {
            None
        };
        Ok(Self {
            handlers: Handlers::new(store, resolve_session(user_id, config), cloud),
            sync_configured: config.is_sync_configured(),
        })
    }

    pub const fn handlers(&self) -> &Handlers<HttpCloudClient> {
        &self.handlers
    }

    pub const fn is_sync_configured(&self) -> bool {
        self.sync_configured
    }

    /// Handle a request, turning a failed response into an error
    pub async fn dispatch(&self, request: Request) -> Result<Response, CliError> {
        match self.handlers.handle(request).await {
            Response::Failed { request, error } => Err(CliError::Request {
                event: request,
                error,
            }),
            response => Ok(response),
        }
    }
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> PathBuf {
    cli_config_path
        .or_else(|| env::var_os("LEAFLET_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn load_config(path: &Path) -> Result<ClientConfig, CliError> {
    Ok(ClientConfig::load(path)?.with_env()?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &ClientConfig) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LEAFLET_DB_PATH").map(PathBuf::from))
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leaflet")
        .join("leaflet.db")
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leaflet")
        .join("config.json")
}

/// `--user-id` wins over the configured user; neither means anonymous
pub fn resolve_session(user_id: Option<String>, config: &ClientConfig) -> Session {
    let user_id = user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    match (user_id, &config.user) {
        (Some(id), _) => Session::signed_in(User {
            id,
            name: None,
            email: None,
        }),
        (None, Some(user)) => Session::signed_in(user.clone()),
        (None, None) => Session::anonymous(),
    }
}

pub fn parse_id(raw: &str) -> Result<DocId, CliError> {
    raw.parse()
        .map_err(|_| CliError::InvalidId(raw.to_string()))
}

pub fn parse_optional_id(raw: Option<&str>) -> Result<Option<DocId>, CliError> {
    raw.map(parse_id).transpose()
}

/// Editor payload from `--content`; absent means an empty block list
pub fn parse_content(raw: Option<&str>) -> Result<Value, CliError> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(Value::Array(Vec::new())),
        Some(raw) => {
            serde_json::from_str(raw).map_err(|error| CliError::InvalidContent(error.to_string()))
        }
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = note.id.as_str().chars().take(13).collect::<String>();
            let title = title_preview(&note.title, 40);
            let modified = format_relative_time(note.dt_modify, now_ms);
            format!("{short_id:<13}  {title:<40}  {modified}")
        })
        .collect()
}

pub fn title_preview(title: &str, max_chars: usize) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "(untitled)".to_string();
    }
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let diff = now_ms.saturating_sub(timestamp_ms);
    if diff < MINUTE {
        "just now".to_string()
    } else if diff < HOUR {
        format!("{}m ago", diff / MINUTE)
    } else if diff < DAY {
        format!("{}h ago", diff / HOUR)
    } else if diff < 7 * DAY {
        format!("{}d ago", diff / DAY)
    } else {
        format_timestamp(timestamp_ms)
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
