//! Embedded schema migrations.
//!
//! Each step is applied once, in version order, inside its own transaction
//! and recorded in `schema_migrations`.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration {version} ({name}) failed: {source}")]
    Step {
        version: u32,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The file was written by a newer build with steps we do not know.
    #[error("Schema version {found} is newer than supported version {supported}")]
    TooNew { found: u32, supported: u32 },
}

/// `(version, name, sql)`, ascending by version.
const STEPS: &[(u32, &str, &str)] = &[(1, "initial", include_str!("001_initial.sql"))];

const BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY NOT NULL,
    name       TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

/// Highest version this build knows how to apply.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |&(version, _, _)| version)
}

/// Version recorded in the database, 0 for a fresh file.
pub fn current_version(conn: &Connection) -> Result<u32, MigrationError> {
    conn.execute_batch(BOOKKEEPING)?;
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Bring the schema up to [`latest_version`]. Returns how many steps ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    let current = current_version(conn)?;
    let supported = latest_version();
    if current > supported {
        return Err(MigrationError::TooNew {
            found: current,
            supported,
        });
    }

    let mut applied = 0;
    for &(version, name, sql) in STEPS.iter().filter(|(v, _, _)| *v > current) {
        let step_failed = |source| MigrationError::Step {
            version,
            name,
            source,
        };

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql).map_err(step_failed)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![version, name],
        )
        .map_err(step_failed)?;
        tx.commit().map_err(step_failed)?;

        applied += 1;
    }

    Ok(applied)
}
