//! The two-stage existence check of one probe against one database.

use crate::column::Column;
use crate::error::{ErrorKind, Result};
use crate::handle::Handle;
use exn::{OptionExt, ResultExt};
use othd_probe::Probe;

/// Length of the truncated SHA-1 values some databases store.
const TRUNCATED_SHA1_LEN: usize = 16;

impl Handle {
    /// Is the probed file recorded in this database?
    ///
    /// 1. **Size filter**: if the database has a size column and no row has
    ///    the probe's size, answer `false` without computing any digest.
    /// 2. **Full match**: compute (or reuse from the probe) every digest this
    ///    database indexes, then check for a row equal on every column the
    ///    database has. Columns it lacks are not part of the predicate.
    ///
    /// A size-only database is a pure size-membership test. Storage or digest
    /// failures surface as [`ErrorKind::QueryExecution`], never as `false`.
    pub async fn query(&self, probe: &Probe) -> Result<bool> {
        // No stored INTEGER can equal a size beyond i64::MAX.
        let Ok(size) = i64::try_from(probe.size()) else {
            return Ok(false);
        };
        if self.columns().contains(Column::Size) {
            let exists = self.size_exists(size).await?;
            tracing::trace!(database = %self.uuid(), size, exists, "stage 1: size filter");
            if !exists {
                return Ok(false);
            }
            if self.algorithms().is_empty() {
                return Ok(true);
            }
        }

        let digests = probe.digests(self.algorithms()).await.or_raise(|| ErrorKind::QueryExecution)?;
        let mut query = sqlx::query_scalar::<_, bool>(&self.full_match_sql);
        for column in self.columns().iter() {
            query = match column.algorithm() {
                None => query.bind(size),
                Some(algorithm) => {
                    let digest = digests.get(algorithm).ok_or_raise(|| ErrorKind::QueryExecution)?;
                    let bytes = digest.as_bytes();
                    match column {
                        Column::Sha1 => query.bind(bytes.to_vec()).bind(bytes[..TRUNCATED_SHA1_LEN].to_vec()),
                        _ => query.bind(bytes.to_vec()),
                    }
                },
            };
        }
        let found = query.fetch_one(self.database().pool()).await.or_raise(|| ErrorKind::QueryExecution)?;
        tracing::trace!(database = %self.uuid(), size, found, "stage 2: full match");
        Ok(found)
    }

    async fn size_exists(&self, size: i64) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(include_str!("../queries/size_exists.sql"))
            .bind(size)
            .fetch_one(self.database().pool())
            .await
            .or_raise(|| ErrorKind::QueryExecution)
    }
}

#[cfg(test)]
mod tests {
    use crate::column::Column;
    use crate::error::ErrorKind;
    use crate::fixtures::{FileRow, Fixture};
    use crate::handle::Handle;
    use othd_probe::{Algorithm, AlgorithmSet, CountingSource, Probe};
    use rstest::rstest;
    use tempfile::TempDir;
    use uuid::Uuid;

    const KNOWN: &[u8] = b"known system file contents";

    async fn handle(dir: &TempDir, columns: &[Column], rows: &[&[u8]]) -> Handle {
        let mut fixture = Fixture::new("q", Uuid::from_u128(9)).columns(columns.iter().copied());
        for row in rows {
            fixture = fixture.content(row);
        }
        let path = fixture.build(dir.path().join("q.othd")).await;
        Handle::open(&path, None).await.unwrap()
    }

    fn probe(content: &[u8]) -> (Probe, CountingSource) {
        let source = CountingSource::new(content.to_vec());
        (Probe::new(content.len() as u64, AlgorithmSet::all(), source.clone()), source)
    }

    #[rstest]
    #[case(&[Column::Size, Column::Sha1, Column::Md5])]
    #[case(&[Column::Size, Column::Sha1])]
    #[case(&[Column::Size, Column::Md5])]
    #[case(&[Column::Sha1, Column::Md5])]
    #[case(&[Column::Sha1])]
    #[case(&[Column::Md5])]
    #[case(&[Column::Size])]
    #[tokio::test]
    async fn test_known_file_matches(#[case] columns: &[Column]) {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle(&dir, columns, &[KNOWN]).await;
        let (probe, _) = probe(KNOWN);
        assert!(handle.query(&probe).await.unwrap());
        handle.close().await;
    }

    #[tokio::test]
    async fn test_size_miss_short_circuits_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle(&dir, &Column::ALL, &[KNOWN]).await;
        let (probe, source) = probe(b"a different length");
        assert!(!handle.query(&probe).await.unwrap());
        assert_eq!(source.total(), 0);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_same_size_different_sha1() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle(&dir, &[Column::Size, Column::Sha1], &[KNOWN]).await;
        let mut impostor = KNOWN.to_vec();
        impostor[0] ^= 0xFF;
        let (probe, source) = probe(&impostor);
        assert!(!handle.query(&probe).await.unwrap());
        assert_eq!(source.count(Algorithm::Sha1), 1);
        assert_eq!(source.count(Algorithm::Md5), 0, "md5 is not indexed by this database");
        handle.close().await;
    }

    #[tokio::test]
    async fn test_size_only_database_never_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle(&dir, &[Column::Size], &[KNOWN]).await;
        let mut same_size = KNOWN.to_vec();
        same_size.reverse();
        let (probe, source) = probe(&same_size);
        assert!(handle.query(&probe).await.unwrap(), "size-only databases are a size membership test");
        assert_eq!(source.total(), 0);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_hash_only_database_always_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle(&dir, &[Column::Sha1, Column::Md5], &[KNOWN]).await;
        let (probe, source) = probe(b"unknown");
        assert!(!handle.query(&probe).await.unwrap());
        assert_eq!(source.count(Algorithm::Sha1), 1);
        assert_eq!(source.count(Algorithm::Md5), 1);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_columns_must_all_match_the_same_row() {
        let dir = tempfile::tempdir().unwrap();
        let other: &[u8] = b"another known file with a different size";
        let known = FileRow::from_content(KNOWN);
        let other_row = FileRow::from_content(other);
        // Size and sha1 of KNOWN, md5 of `other`: each column matches some row, but no single row matches.
        let mixed = FileRow { md5: other_row.md5.clone(), ..known };
        let path = Fixture::default().row(mixed).row(other_row).build(dir.path().join("m.othd")).await;
        let handle = Handle::open(&path, None).await.unwrap();
        let (probe, _) = probe(KNOWN);
        assert!(!handle.query(&probe).await.unwrap());
        handle.close().await;
    }

    #[tokio::test]
    async fn test_digests_are_reused_across_databases() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let a = handle(&dir_a, &[Column::Size, Column::Sha1], &[KNOWN]).await;
        let b = handle(&dir_b, &Column::ALL, &[KNOWN]).await;
        let (probe, source) = probe(KNOWN);
        assert!(a.query(&probe).await.unwrap());
        assert!(b.query(&probe).await.unwrap());
        assert_eq!(source.count(Algorithm::Sha1), 1);
        assert_eq!(source.count(Algorithm::Md5), 1);
        a.close().await;
        b.close().await;
    }

    #[tokio::test]
    async fn test_unreadable_file_is_an_error_not_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let handle = handle(&dir, &[Column::Sha1], &[KNOWN]).await;
        let source = CountingSource::failing(KNOWN.to_vec());
        let probe = Probe::new(KNOWN.len() as u64, AlgorithmSet::all(), source);
        let err = handle.query(&probe).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::QueryExecution));
        handle.close().await;
    }

    #[rstest]
    #[case(&[Column::Size, Column::Sha1])]
    #[case(&[Column::Sha1])]
    #[case(&[Column::Sha1, Column::Md5])]
    #[tokio::test]
    async fn test_truncated_sha1_matches(#[case] columns: &[Column]) {
        let dir = tempfile::tempdir().unwrap();
        let mut row = FileRow::from_content(KNOWN);
        row.sha1.truncate(16);
        let path = Fixture::default().columns(columns.iter().copied()).row(row).build(dir.path().join("t.othd")).await;
        let handle = Handle::open(&path, None).await.unwrap();

        let (known, _) = probe(KNOWN);
        assert!(handle.query(&known).await.unwrap());
        let mut impostor = KNOWN.to_vec();
        impostor[0] ^= 0xFF;
        let (impostor, _) = probe(&impostor);
        assert!(!handle.query(&impostor).await.unwrap());
        handle.close().await;
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty: &[u8] = b"";
        let handle = handle(&dir, &Column::ALL, &[empty]).await;
        let (probe, _) = probe(b"");
        assert!(handle.query(&probe).await.unwrap());
        handle.close().await;
    }
}
