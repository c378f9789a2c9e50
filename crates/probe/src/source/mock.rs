//! In-memory digest source that counts how often each algorithm is computed.

use crate::digest::{Digests, MultiHasher};
use crate::error::{ErrorKind, Result};
use crate::source::DigestSource;
use crate::{Algorithm, AlgorithmSet};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory digest source for testing.
///
/// Every call to [`compute`](DigestSource::compute) increments a counter for
/// each algorithm requested. Clones share counters, so a test can keep one
/// clone while the other is moved into a [`Probe`](crate::Probe).
///
/// # Examples
///
/// ```
/// use othd_probe::{Algorithm, AlgorithmSet, CountingSource, Probe};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = CountingSource::new(b"abc".to_vec());
/// let probe = Probe::new(3, AlgorithmSet::all(), source.clone());
/// probe.digests(AlgorithmSet::from([Algorithm::Md5])).await.unwrap();
/// probe.digests(AlgorithmSet::from([Algorithm::Md5])).await.unwrap();
/// assert_eq!(source.count(Algorithm::Md5), 1);
/// assert_eq!(source.count(Algorithm::Sha1), 0);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct CountingSource {
    data: Arc<Vec<u8>>,
    sha1: Arc<AtomicUsize>,
    md5: Arc<AtomicUsize>,
    failing: bool,
}
impl CountingSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Arc::new(data.into()),
            sha1: Arc::default(),
            md5: Arc::default(),
            failing: false,
        }
    }

    /// A source whose every read fails as if the underlying media were
    /// unreadable. Counters still increment.
    pub fn failing(data: impl Into<Vec<u8>>) -> Self {
        Self { failing: true, ..Self::new(data) }
    }

    /// Number of times `algorithm` has been computed.
    pub fn count(&self, algorithm: Algorithm) -> usize {
        match algorithm {
            Algorithm::Sha1 => self.sha1.load(Ordering::SeqCst),
            Algorithm::Md5 => self.md5.load(Ordering::SeqCst),
        }
    }

    /// Total number of digest computations across all algorithms.
    pub fn total(&self) -> usize {
        self.count(Algorithm::Sha1) + self.count(Algorithm::Md5)
    }
}

#[async_trait]
impl DigestSource for CountingSource {
    async fn compute(&self, expected_size: u64, algorithms: AlgorithmSet) -> Result<Digests> {
        for algorithm in algorithms.iter() {
            match algorithm {
                Algorithm::Sha1 => self.sha1.fetch_add(1, Ordering::SeqCst),
                Algorithm::Md5 => self.md5.fetch_add(1, Ordering::SeqCst),
            };
        }
        if self.failing {
            exn::bail!(ErrorKind::Io(std::io::Error::other("simulated media failure")));
        }
        let mut hasher = MultiHasher::new(algorithms);
        hasher.update(&self.data);
        hasher.finish(expected_size)
    }
}
