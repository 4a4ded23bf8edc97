//! Sync watermark persistence

use libsql::Connection;
use serde::{Deserialize, Serialize};

use super::DocumentStore;
use crate::error::Result;

const LAST_PUSH_KEY: &str = "last_push_at";
const LAST_PULL_KEY: &str = "last_pull_at";

/// Timestamps (Unix ms) of the last successful push and pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermarks {
    pub last_push_at: i64,
    pub last_pull_at: i64,
}

/// Reads and writes [`Watermarks`] in the `sync_state` table
pub struct SyncStateRepository<'a> {
    store: &'a DocumentStore,
}

impl<'a> SyncStateRepository<'a> {
    pub const fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Load watermarks; missing values read as 0 (never synced)
    pub async fn load(&self) -> Result<Watermarks> {
        let db = self.store.lock().await;
        let conn = db.connection();
        Ok(Watermarks {
            last_push_at: get_value(conn, LAST_PUSH_KEY).await?.unwrap_or_default(),
            last_pull_at: get_value(conn, LAST_PULL_KEY).await?.unwrap_or_default(),
        })
    }

    pub async fn save(&self, watermarks: &Watermarks) -> Result<()> {
        let db = self.store.lock().await;
        let conn = db.connection();
        set_value(conn, LAST_PUSH_KEY, watermarks.last_push_at).await?;
        set_value(conn, LAST_PULL_KEY, watermarks.last_pull_at).await?;
        Ok(())
    }
}

async fn get_value(conn: &Connection, key: &str) -> Result<Option<i64>> {
    let mut rows = conn
        .query("SELECT value FROM sync_state WHERE key = ?", [key])
        .await?;

    if let Some(row) = rows.next().await? {
        Ok(Some(row.get(0)?))
    } else {
        Ok(None)
    }
}

async fn set_value(conn: &Connection, key: &str, value: i64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sync_state (key, value) VALUES (?, ?)",
        libsql::params![key, value],
    )
    .await?;
    Ok(())
}
