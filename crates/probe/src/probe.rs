//! The per-file identity bundle evaluated against hash databases.

use crate::digest::Digests;
use crate::error::{ErrorKind, Result};
use crate::source::{BytesSource, DigestSource, FileSource};
use crate::{Algorithm, AlgorithmSet};
use exn::OptionExt;
use std::fmt;
use std::path::Path;
use tokio::sync::Mutex;

/// A lazily-evaluated file identity: a size known up front, plus SHA-1 and
/// MD5 digests that are only computed when a database actually needs them.
///
/// Each digest is computed at most once for the lifetime of the probe and
/// reused by every subsequent database query. Only the algorithms in the
/// probe's `required` set (normally the registry's required hashes) may ever
/// be computed; asking for anything else fails with
/// [`ErrorKind::Unavailable`].
///
/// A probe is owned by whoever is evaluating that file. The digest cache is
/// never shared between probes.
pub struct Probe {
    size: u64,
    required: AlgorithmSet,
    source: Box<dyn DigestSource>,
    cache: Mutex<Digests>,
}
impl Probe {
    pub fn new(size: u64, required: AlgorithmSet, source: impl DigestSource + 'static) -> Self {
        Self {
            size,
            required,
            source: Box::new(source),
            cache: Mutex::new(Digests::default()),
        }
    }

    /// Probe for in-memory contents; the size is the length of the data.
    pub fn from_bytes(data: impl Into<Vec<u8>>, required: AlgorithmSet) -> Self {
        let source = BytesSource::new(data);
        Self::new(source.len(), required, source)
    }

    /// Probe for a file on disk. Only the file's metadata is read here; the
    /// contents are read the first time a digest is needed.
    pub async fn from_path(path: impl AsRef<Path>, required: AlgorithmSet) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
        Ok(Self::new(metadata.len(), required, FileSource::new(path)))
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn required(&self) -> AlgorithmSet {
        self.required
    }

    /// Algorithms whose digest has already been computed.
    pub async fn computed(&self) -> AlgorithmSet {
        self.cache.lock().await.available()
    }

    /// Return the digests for `wanted`, computing whichever are missing in a
    /// single pass over the source.
    ///
    /// Concurrent callers on the same probe wait for each other rather than
    /// hashing the same content twice.
    pub async fn digests(&self, wanted: AlgorithmSet) -> Result<Digests> {
        if let Some(algorithm) = wanted.difference(self.required).iter().next() {
            exn::bail!(ErrorKind::Unavailable(algorithm));
        }
        let mut cache = self.cache.lock().await;
        let missing = wanted.difference(cache.available());
        if !missing.is_empty() {
            tracing::trace!(size = self.size, algorithms = %missing, "computing digests");
            let computed = self.source.compute(self.size, missing).await?;
            for algorithm in missing.iter() {
                computed.get(algorithm).ok_or_raise(|| ErrorKind::Unavailable(algorithm))?;
            }
            cache.merge(computed.restrict(missing));
        }
        Ok(cache.restrict(wanted))
    }

    /// Convenience accessor for a single algorithm.
    pub async fn digest(&self, algorithm: Algorithm) -> Result<crate::Digest> {
        let digests = self.digests(AlgorithmSet::from([algorithm])).await?;
        digests.get(algorithm).ok_or_raise(|| ErrorKind::Unavailable(algorithm))
    }
}
impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe").field("size", &self.size).field("required", &self.required).finish_non_exhaustive()
    }
}
