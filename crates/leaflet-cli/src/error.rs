use std::io;

use leaflet_core::sync::CloudError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] leaflet_core::Error),
    #[error(transparent)]
    Cloud(#[from] CloudError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid note content: {0}")]
    InvalidContent(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{event} failed: {error}")]
    Request { event: String, error: String },
    #[error(
        "Sync is not configured. Set api_base_url in the config file or LEAFLET_API_URL in the environment."
    )]
    SyncNotConfigured,
}
