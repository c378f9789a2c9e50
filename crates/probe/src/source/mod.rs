//! Digest sources: where a probe's bytes come from when a digest is needed.
//!
//! The host pipeline owns the bytes of the file under test. A probe only
//! asks for them (through [`DigestSource::compute`]) the first time a hash
//! database actually needs a digest it hasn't computed yet.

mod bytes;
mod file;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::bytes::BytesSource;
pub use self::file::FileSource;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::CountingSource;
use crate::AlgorithmSet;
use crate::digest::Digests;
use crate::error::Result;
use async_trait::async_trait;

/// Something that can produce digests of a file's contents on demand.
///
/// Implementations should read the contents once per call and compute every
/// requested algorithm in that single pass (see
/// [`MultiHasher`](crate::MultiHasher)). The returned [`Digests`] must contain
/// a value for every requested algorithm.
#[async_trait]
pub trait DigestSource: Send + Sync {
    /// Compute `algorithms` over the whole content, which is expected to be
    /// exactly `expected_size` bytes long.
    async fn compute(&self, expected_size: u64, algorithms: AlgorithmSet) -> Result<Digests>;
}
