//! An opened, validated hash database.

use crate::column::{Column, ColumnSet};
use crate::db::Database;
use crate::error::Result;
use crate::header::{Header, read_header};
use crate::schema::inspect_columns;
use othd_probe::AlgorithmSet;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

/// `PRAGMA application_id` expected of an OTHD database: ASCII "OTHD".
pub const APPLICATION_ID: i64 = 0x4F54_4844;
/// The only `PRAGMA user_version` (schema version) this engine understands.
pub const SUPPORTED_VERSION: i64 = 1;

/// A reference database that passed header and schema validation.
///
/// Immutable once created. The metadata tags are recorded for reporting and
/// future version gating but do not currently affect admission.
#[derive(Debug, Clone)]
pub struct Handle {
    db: Database,
    header: Header,
    columns: ColumnSet,
    application_id: i64,
    user_version: i64,
    /// Stage 2 existence check over exactly the columns this database has.
    pub(crate) full_match_sql: String,
}

impl Handle {
    /// Open `path` read-only and validate it into a handle.
    ///
    /// Fails with [`Open`](crate::error::ErrorKind::Open),
    /// [`MissingHeader`](crate::error::ErrorKind::MissingHeader) or
    /// [`EmptySchema`](crate::error::ErrorKind::EmptySchema).
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, max_connections: Option<u32>) -> Result<Self> {
        let db = Database::open(path, max_connections).await?;
        match Self::validate(db.clone()).await {
            Ok(handle) => Ok(handle),
            Err(err) => {
                db.close().await;
                Err(err)
            },
        }
    }

    async fn validate(db: Database) -> Result<Self> {
        let header = read_header(&db).await?;
        let columns = inspect_columns(&db).await?;
        let application_id = db.application_id().await?;
        let user_version = db.user_version().await?;
        if application_id != APPLICATION_ID || user_version != SUPPORTED_VERSION {
            tracing::debug!(
                path = %db.path().display(),
                application_id,
                user_version,
                "database carries unexpected metadata tags"
            );
        }
        let full_match_sql = full_match_sql(&columns);
        Ok(Self { db, header, columns, application_id, user_version, full_match_sql })
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    pub fn uuid(&self) -> Uuid {
        self.header.uuid
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn description(&self) -> &str {
        &self.header.description
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Digest algorithms a match against this database requires.
    pub fn algorithms(&self) -> AlgorithmSet {
        self.columns.algorithms()
    }

    pub fn application_id(&self) -> i64 {
        self.application_id
    }

    pub fn user_version(&self) -> i64 {
        self.user_version
    }

    pub fn is_application_id_valid(&self) -> bool {
        self.application_id == APPLICATION_ID
    }

    pub fn is_version_supported(&self) -> bool {
        self.user_version == SUPPORTED_VERSION
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// `SELECT EXISTS(...)` conjoining equality on every present column, in
/// lookup order so the composite (size, sha1, md5) index applies.
///
/// Stored SHA-1 values may be the full 20 bytes or truncated to 16, so the
/// sha1 column takes two parameters: the full digest, then its prefix.
fn full_match_sql(columns: &ColumnSet) -> String {
    let predicate: Vec<String> = columns
        .iter()
        .map(|c: Column| match c {
            Column::Sha1 => format!("{} IN (?, ?)", c.name()),
            _ => format!("{} = ?", c.name()),
        })
        .collect();
    format!("SELECT EXISTS (SELECT 1 FROM files WHERE {})", predicate.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures::Fixture;
    use rstest::rstest;

    #[rstest]
    #[case(ColumnSet::from(Column::ALL), "SELECT EXISTS (SELECT 1 FROM files WHERE size = ? AND sha1 IN (?, ?) AND md5 = ?)")]
    #[case(ColumnSet::from([Column::Md5, Column::Sha1]), "SELECT EXISTS (SELECT 1 FROM files WHERE sha1 IN (?, ?) AND md5 = ?)")]
    #[case(ColumnSet::from([Column::Size]), "SELECT EXISTS (SELECT 1 FROM files WHERE size = ?)")]
    fn test_full_match_sql(#[case] columns: ColumnSet, #[case] expected: &str) {
        assert_eq!(full_match_sql(&columns), expected);
    }

    #[tokio::test]
    async fn test_open_valid() {
        let dir = tempfile::tempdir().unwrap();
        let uuid = Uuid::from_u128(0xABCD);
        let path = Fixture::new("NSRL subset", uuid)
            .description("Built for tests")
            .columns([Column::Size, Column::Sha1])
            .build(dir.path().join("v.othd"))
            .await;
        let handle = Handle::open(&path, None).await.unwrap();
        assert_eq!(handle.uuid(), uuid);
        assert_eq!(handle.name(), "NSRL subset");
        assert_eq!(handle.description(), "Built for tests");
        assert_eq!(handle.columns(), &ColumnSet::from([Column::Size, Column::Sha1]));
        assert!(handle.is_application_id_valid());
        assert!(handle.is_version_supported());
        handle.close().await;
    }

    #[tokio::test]
    async fn test_unexpected_tags_do_not_block_admission() {
        let dir = tempfile::tempdir().unwrap();
        let path = Fixture::default().application_id(7).user_version(2).build(dir.path().join("t.othd")).await;
        let handle = Handle::open(&path, None).await.unwrap();
        assert!(!handle.is_application_id_valid());
        assert!(!handle.is_version_supported());
        assert_eq!(handle.application_id(), 7);
        assert_eq!(handle.user_version(), 2);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_header_checked_before_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            Fixture::default().without_header_table().raw_columns(["path"]).build(dir.path().join("x.othd")).await;
        let err = Handle::open(&path, None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingHeader(_)));
    }
}
