//! r2d2 pooling over SQLite.
//!
//! Every connection handed out has foreign keys enforced, and the schema is
//! migrated before the pool is returned.

use localflix_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Readers run concurrently under WAL; writes are serialized by the caller.
const FILE_POOL_SIZE: u32 = 4;

const FILE_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;";

/// Open (creating if needed) the database file at `db_path`.
///
/// ```no_run
/// let pool = localflix_db::pool::init_pool("/var/lib/localflix/library.db").unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager =
        SqliteConnectionManager::file(db_path).with_init(|conn| conn.execute_batch(FILE_PRAGMAS));
    build(manager, FILE_POOL_SIZE)
}

/// A migrated in-memory database.
///
/// Each `:memory:` connection is a separate database, so the pool is capped
/// at one connection and callers queue for it.
///
/// ```
/// let pool = localflix_db::pool::init_memory_pool().unwrap();
/// assert_eq!(pool.max_size(), 1);
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    build(manager, 1)
}

fn build(manager: SqliteConnectionManager, size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(size)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to open database: {e}")))?;

    let conn = get_conn(&pool)?;
    let applied = migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to migrate database: {e}")))?;
    if applied > 0 {
        tracing::info!(applied, version = migrations::latest_version(), "Database migrated");
    }
    drop(conn);

    Ok(pool)
}

/// Check out a connection, mapping pool exhaustion to [`Error::Database`].
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("No database connection available: {e}")))
}
