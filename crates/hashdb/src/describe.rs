//! Human-facing description of a hash database: tags, layout and contents.

use crate::column::Column;
use crate::db::Database;
use crate::error::{ErrorKind, Result};
use crate::handle::{APPLICATION_ID, Handle, SUPPORTED_VERSION};
use exn::ResultExt;
use serde::Serialize;
use sqlx::Row;
use std::path::PathBuf;
use uuid::Uuid;

/// An index on the files relation and the columns it covers, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
}

/// Everything worth knowing about a database when deciding whether to trust
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Description {
    pub path: PathBuf,
    pub application_id: i64,
    pub application_id_valid: bool,
    pub db_version: i64,
    pub db_version_supported: bool,
    pub name: String,
    pub description: String,
    pub uuid: Uuid,
    /// Every column of the files relation, known or not.
    pub columns: Vec<String>,
    pub indexes: Vec<IndexInfo>,
    pub has_ideal_index: bool,
    pub entries: u64,
}

/// One row of the files relation; absent columns are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SampleRow {
    pub size: Option<u64>,
    pub sha1: Option<Vec<u8>>,
    pub md5: Option<Vec<u8>>,
}

/// An index is ideal when it covers as many columns as the files relation
/// has and, if there is a size column, leads with it (so both stage 1 and
/// stage 2 lookups can use it).
pub fn is_ideal_index(index: &IndexInfo, table_columns: &[String]) -> bool {
    if index.columns.len() != table_columns.len() {
        return false;
    }
    if table_columns.iter().any(|c| c == Column::Size.name()) {
        return index.columns.first().map(String::as_str) == Some(Column::Size.name());
    }
    true
}

impl Handle {
    pub async fn describe(&self) -> Result<Description> {
        let db = self.database();
        let columns = db.table_columns("files").await?;
        let indexes = indexes(db).await?;
        let has_ideal_index = indexes.iter().any(|i| is_ideal_index(i, &columns));
        let entries: i64 = sqlx::query_scalar(include_str!("../queries/count_files.sql"))
            .fetch_one(db.pool())
            .await
            .or_raise(|| ErrorKind::QueryExecution)?;
        Ok(Description {
            path: self.path().to_path_buf(),
            application_id: self.application_id(),
            application_id_valid: self.application_id() == APPLICATION_ID,
            db_version: self.user_version(),
            db_version_supported: self.user_version() == SUPPORTED_VERSION,
            name: self.name().to_string(),
            description: self.description().to_string(),
            uuid: self.uuid(),
            columns,
            indexes,
            has_ideal_index,
            entries: u64::try_from(entries).or_raise(|| ErrorKind::InvalidData("entry count"))?,
        })
    }

    /// The `limit` most recently inserted rows of the files relation.
    pub async fn sample_rows(&self, limit: u32) -> Result<Vec<SampleRow>> {
        let names: Vec<&str> = self.columns().iter().map(|c| c.name()).collect();
        let sql = format!("SELECT {} FROM files ORDER BY rowid DESC LIMIT ?", names.join(", "));
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.database().pool())
            .await
            .or_raise(|| ErrorKind::QueryExecution)?;
        rows.iter()
            .map(|row| -> Result<SampleRow> {
                let mut sample = SampleRow::default();
                for column in self.columns().iter() {
                    let name = column.name();
                    match column {
                        Column::Size => {
                            let size: i64 = row.try_get(name).or_raise(|| ErrorKind::InvalidData("size"))?;
                            sample.size = Some(u64::try_from(size).or_raise(|| ErrorKind::InvalidData("size"))?);
                        },
                        Column::Sha1 => sample.sha1 = Some(row.try_get(name).or_raise(|| ErrorKind::InvalidData("sha1"))?),
                        Column::Md5 => sample.md5 = Some(row.try_get(name).or_raise(|| ErrorKind::InvalidData("md5"))?),
                    }
                }
                Ok(sample)
            })
            .collect()
    }
}

async fn indexes(db: &Database) -> Result<Vec<IndexInfo>> {
    let names: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_indexes.sql"))
        .fetch_all(db.pool())
        .await
        .or_raise(|| ErrorKind::QueryExecution)?;
    let mut indexes = Vec::with_capacity(names.len());
    for name in names {
        let columns: Vec<String> = sqlx::query_scalar(include_str!("../queries/index_columns.sql"))
            .bind(&name)
            .fetch_all(db.pool())
            .await
            .or_raise(|| ErrorKind::QueryExecution)?;
        indexes.push(IndexInfo { name, columns });
    }
    Ok(indexes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;
    use rstest::rstest;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&["size", "sha1", "md5"], &["size", "sha1", "md5"], true)]
    #[case(&["size", "md5", "sha1"], &["size", "sha1", "md5"], true)]
    #[case(&["sha1", "size", "md5"], &["size", "sha1", "md5"], false)]
    #[case(&["size"], &["size", "sha1", "md5"], false)]
    #[case(&["md5", "sha1"], &["sha1", "md5"], true)]
    fn test_is_ideal_index(#[case] index: &[&str], #[case] table: &[&str], #[case] expected: bool) {
        let index = IndexInfo { name: "i".into(), columns: strings(index) };
        assert_eq!(is_ideal_index(&index, &strings(table)), expected);
    }

    #[tokio::test]
    async fn test_describe() {
        let dir = tempfile::tempdir().unwrap();
        let uuid = Uuid::from_u128(0x42);
        let path = Fixture::new("N", uuid)
            .description("D")
            .content(b"one")
            .content(b"two!")
            .build(dir.path().join("d.othd"))
            .await;
        let handle = Handle::open(&path, None).await.unwrap();
        let description = handle.describe().await.unwrap();
        assert_eq!(description.name, "N");
        assert_eq!(description.description, "D");
        assert_eq!(description.uuid, uuid);
        assert!(description.application_id_valid);
        assert!(description.db_version_supported);
        assert_eq!(description.columns, strings(&["size", "sha1", "md5"]));
        assert_eq!(description.indexes, vec![IndexInfo { name: "files_lookup".into(), columns: strings(&["size", "sha1", "md5"]) }]);
        assert!(description.has_ideal_index);
        assert_eq!(description.entries, 2);

        let samples = handle.sample_rows(20).await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].size, Some(4), "most recent row first");
        assert_eq!(samples[0].md5.as_ref().map(Vec::len), Some(16));
        handle.close().await;
    }

    #[tokio::test]
    async fn test_describe_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = Fixture::default().columns([Column::Sha1]).without_index().build(dir.path().join("d.othd")).await;
        let handle = Handle::open(&path, None).await.unwrap();
        let description = handle.describe().await.unwrap();
        assert!(description.indexes.is_empty());
        assert!(!description.has_ideal_index);
        assert_eq!(description.entries, 0);
        let samples = handle.sample_rows(20).await.unwrap();
        assert!(samples.is_empty());
        handle.close().await;
    }
}
