//! Raw digest values and the single-pass hasher that produces them.

use crate::Algorithm;
use crate::AlgorithmSet;
use crate::error::{ErrorKind, Result};
use md5::{Digest as _, Md5};
use sha1::Sha1;
use std::fmt;

/// A raw (not hex-encoded) digest value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digest {
    Sha1([u8; 20]),
    Md5([u8; 16]),
}
impl Digest {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Sha1(_) => Algorithm::Sha1,
            Self::Md5(_) => Algorithm::Md5,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Sha1(bytes) => bytes,
            Self::Md5(bytes) => bytes,
        }
    }
}
impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{self}", self.algorithm())
    }
}

/// Digests computed so far for one file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Digests {
    pub sha1: Option<[u8; 20]>,
    pub md5: Option<[u8; 16]>,
}
impl Digests {
    pub fn get(&self, algorithm: Algorithm) -> Option<Digest> {
        match algorithm {
            Algorithm::Sha1 => self.sha1.map(Digest::Sha1),
            Algorithm::Md5 => self.md5.map(Digest::Md5),
        }
    }

    /// The set of algorithms that have a value.
    pub fn available(&self) -> AlgorithmSet {
        Algorithm::ALL.into_iter().filter(|a| self.get(*a).is_some()).collect()
    }

    /// Copy in every value present in `other`, keeping existing values.
    pub(crate) fn merge(&mut self, other: Digests) {
        self.sha1 = self.sha1.or(other.sha1);
        self.md5 = self.md5.or(other.md5);
    }

    /// Keep only the values for the given algorithms.
    #[must_use]
    pub fn restrict(self, algorithms: AlgorithmSet) -> Self {
        Self {
            sha1: self.sha1.filter(|_| algorithms.contains(Algorithm::Sha1)),
            md5: self.md5.filter(|_| algorithms.contains(Algorithm::Md5)),
        }
    }
}

/// Feeds the same bytes to every requested algorithm in one pass.
///
/// Digest sources stream a file's contents through this exactly once, no
/// matter how many algorithms were asked for.
pub struct MultiHasher {
    sha1: Option<Sha1>,
    md5: Option<Md5>,
    read: u64,
}
impl MultiHasher {
    pub fn new(algorithms: AlgorithmSet) -> Self {
        Self {
            sha1: algorithms.contains(Algorithm::Sha1).then(Sha1::new),
            md5: algorithms.contains(Algorithm::Md5).then(Md5::new),
            read: 0,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        if let Some(hasher) = self.sha1.as_mut() {
            hasher.update(chunk);
        }
        if let Some(hasher) = self.md5.as_mut() {
            hasher.update(chunk);
        }
        self.read += chunk.len() as u64;
    }

    /// Finish hashing, checking that the number of bytes seen matches the
    /// size the probe was created with.
    pub fn finish(self, expected_size: u64) -> Result<Digests> {
        if self.read != expected_size {
            exn::bail!(ErrorKind::SizeMismatch { expected: expected_size, actual: self.read });
        }
        Ok(Digests {
            sha1: self.sha1.map(|h| h.finalize().into()),
            md5: self.md5.map(|h| h.finalize().into()),
        })
    }
}
