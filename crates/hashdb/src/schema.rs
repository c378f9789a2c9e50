//! Which of {size, sha1, md5} a database's files relation provides.

use crate::column::{Column, ColumnSet};
use crate::db::Database;
use crate::error::{ErrorKind, Result};

/// Intersect the files relation's columns with {size, sha1, md5}.
///
/// Unknown columns are ignored. Fails with [`ErrorKind::EmptySchema`] if
/// nothing usable is left, including when the files relation doesn't exist.
pub async fn inspect_columns(db: &Database) -> Result<ColumnSet> {
    let names = db.table_columns("files").await?;
    let columns: ColumnSet = names.iter().filter_map(|name| Column::from_name(name)).collect();
    if columns.is_empty() {
        exn::bail!(ErrorKind::EmptySchema(db.path().to_path_buf()));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;

    async fn columns_of(fixture: Fixture) -> Result<ColumnSet> {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture.build(dir.path().join("s.othd")).await;
        let db = Database::open(&path, None).await.unwrap();
        let columns = inspect_columns(&db).await;
        db.close().await;
        columns
    }

    #[tokio::test]
    async fn test_all_columns() {
        let columns = columns_of(Fixture::default()).await.unwrap();
        assert_eq!(columns, ColumnSet::from(Column::ALL));
    }

    #[tokio::test]
    async fn test_unknown_columns_are_ignored() {
        let columns = columns_of(Fixture::default().raw_columns(["path", "md5", "crc32"])).await.unwrap();
        assert_eq!(columns, ColumnSet::from([Column::Md5]));
    }

    #[tokio::test]
    async fn test_no_usable_columns() {
        let err = columns_of(Fixture::default().raw_columns(["path", "sha256"])).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::EmptySchema(_)));
    }

    #[tokio::test]
    async fn test_column_names_are_case_sensitive() {
        let err = columns_of(Fixture::default().raw_columns(["SIZE", "Md5"])).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::EmptySchema(_)));
    }
}
