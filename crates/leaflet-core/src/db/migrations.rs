//! Schema migrations for the document store

use libsql::Connection;

use crate::error::Result;

struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

/// Applied in order; a migration is never edited once released.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "document collections",
        statements: &[
            "CREATE TABLE IF NOT EXISTS notes (_id TEXT PRIMARY KEY, doc TEXT NOT NULL)",
            "CREATE TABLE IF NOT EXISTS directory (_id TEXT PRIMARY KEY, doc TEXT NOT NULL)",
            "CREATE TABLE IF NOT EXISTS collaborators (_id TEXT PRIMARY KEY, doc TEXT NOT NULL)",
            "CREATE INDEX IF NOT EXISTS idx_notes_folder ON notes(json_extract(doc, '$.folderId'))",
            "CREATE INDEX IF NOT EXISTS idx_notes_modified ON notes(json_extract(doc, '$.dtModify'))",
            "CREATE INDEX IF NOT EXISTS idx_directory_modified ON directory(json_extract(doc, '$.dtModify'))",
            "CREATE INDEX IF NOT EXISTS idx_collaborators_folder_email ON collaborators(
                json_extract(doc, '$.folderId'),
                json_extract(doc, '$.email')
            )",
        ],
    },
    Migration {
        version: 2,
        name: "sync watermarks",
        statements: &["CREATE TABLE IF NOT EXISTS sync_state (key TEXT PRIMARY KEY, value INTEGER NOT NULL)"],
    },
];

/// Bring the schema up to the latest version
pub async fn run(conn: &Connection) -> Result<()> {
    let current = schema_version(conn).await?;
    for migration in MIGRATIONS.iter().filter(|migration| migration.version > current) {
        apply(conn, migration).await?;
    }
    Ok(())
}

fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

async fn schema_version(conn: &Connection) -> Result<i64> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;
    if let Err(error) = apply_statements(conn, migration).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error);
    }
    conn.execute("COMMIT", ()).await?;

    tracing::info!(
        "Applied migration {} ({}), latest is {}",
        migration.version,
        migration.name,
        latest_version()
    );
    Ok(())
}

async fn apply_statements(conn: &Connection, migration: &Migration) -> Result<()> {
    for statement in migration.statements {
        conn.execute(statement, ()).await?;
    }
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?, ?)",
        libsql::params![migration.version, chrono::Utc::now().timestamp_millis()],
    )
    .await?;
    Ok(())
}
