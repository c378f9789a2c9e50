//! Filesystem-backed digest source.

use crate::AlgorithmSet;
use crate::digest::{Digests, MultiHasher};
use crate::error::{ErrorKind, Result};
use crate::source::DigestSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::instrument;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Streams a file from disk through the requested hashers.
///
/// The file is opened fresh on every [`compute`](DigestSource::compute)
/// call. A probe only calls it once per batch of missing algorithms, so a
/// file is normally read at most once (twice if a SHA-1 only database is
/// consulted before an MD5 only one).
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}
impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DigestSource for FileSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    async fn compute(&self, expected_size: u64, algorithms: AlgorithmSet) -> Result<Digests> {
        let mut file = File::open(&self.path).await.map_err(|e| ErrorKind::from_io(e, &self.path))?;
        let mut hasher = MultiHasher::new(algorithms);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let read = file.read(&mut buffer).await.map_err(|e| ErrorKind::from_io(e, &self.path))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        hasher.finish(expected_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Algorithm;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let source = FileSource::new(file.path());
        let digests = source.compute(3, AlgorithmSet::all()).await.unwrap();
        assert_eq!(digests.get(Algorithm::Md5).unwrap().to_string(), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(digests.get(Algorithm::Sha1).unwrap().to_string(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("nope.bin"));
        let err = source.compute(0, AlgorithmSet::all()).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_changed_since_probe_was_created() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abcdef").unwrap();
        let source = FileSource::new(file.path());
        let err = source.compute(3, AlgorithmSet::all()).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::SizeMismatch { expected: 3, actual: 6 }));
    }
}
