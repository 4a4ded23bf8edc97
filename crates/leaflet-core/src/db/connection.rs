//! libSQL handle backing the document store

use std::path::Path;

use libsql::{Builder, Connection, Database as LibSqlDatabase};

use super::migrations;
use crate::error::Result;

const MEMORY: &str = ":memory:";

/// Best-effort tuning; in-memory databases reject WAL and keep their default.
const PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode = WAL",
    "PRAGMA synchronous = NORMAL",
    "PRAGMA busy_timeout = 5000",
];

/// A migrated libSQL database and its single connection
pub struct Database {
    _db: LibSqlDatabase,
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path` and migrate it
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect(&path.as_ref().to_string_lossy()).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(MEMORY).await
    }

    async fn connect(location: &str) -> Result<Self> {
        let db = Builder::new_local(location).build().await?;
        let conn = db.connect()?;

        for pragma in PRAGMAS {
            if let Err(error) = conn.execute(pragma, ()).await {
                tracing::debug!("Ignoring `{pragma}` on {location}: {error}");
            }
        }
        migrations::run(&conn).await?;

        tracing::debug!("Opened document store at {location}");
        Ok(Self { _db: db, conn })
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
