//! Read-only database connection pool.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::instrument;

// Queries are tiny indexed lookups; a handful of connections per database is
// plenty even when many probes are evaluated at once.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Read-only connection pool for one candidate database.
///
/// The file is opened with SQLite's `immutable` flag: no locks are taken and
/// no journal is consulted, on the contract that nothing writes to it while
/// the engine is running. A concurrent writer is a caller error and is not
/// detected.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
}

impl Database {
    /// Open the database at `path` read-only and immutable.
    ///
    /// The path is canonicalized, so two spellings of the same file compare
    /// equal afterwards. Fails with [`ErrorKind::Open`] if the file is
    /// missing, unreadable, or not a SQLite database.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, max_connections: Option<u32>) -> Result<Self> {
        let requested = path.as_ref();
        let path = tokio::fs::canonicalize(requested).await.or_raise(|| ErrorKind::Open(requested.to_path_buf()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS).max(1))
            .connect_with(Self::base_options().filename(&path))
            .await
            .or_raise(|| ErrorKind::Open(path.clone()))?;
        let db = Self { pool, path };
        // SQLite only notices that a file isn't a database on first read.
        sqlx::query("SELECT COUNT(1) FROM sqlite_master")
            .execute(&db.pool)
            .await
            .or_raise(|| ErrorKind::Open(db.path.clone()))?;
        Ok(db)
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .read_only(true)
            .immutable(true)
            .create_if_missing(false)
            // Statements are prepared once per connection and reused by every
            // probe; the default cache is far larger than the handful of
            // distinct queries issued here.
            .statement_cache_capacity(16)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Canonical path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `PRAGMA application_id`; OTHD databases carry ASCII "OTHD".
    pub async fn application_id(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("PRAGMA application_id")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Open(self.path.clone()))
    }

    /// `PRAGMA user_version`; the schema version of the OTHD format.
    pub async fn user_version(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Open(self.path.clone()))
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(include_str!("../queries/table_exists.sql"))
            .bind(table)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Open(self.path.clone()))
    }

    /// Column names of `table` in declaration order; empty if the table
    /// doesn't exist.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(include_str!("../queries/table_columns.sql"))
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Open(self.path.clone()))
    }

    /// Close the connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
