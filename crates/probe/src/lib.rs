//! File identities for hash database matching.
//!
//! A [`Probe`] carries the size of one file under test and computes its
//! SHA-1 and MD5 digests lazily, at most once each, and only for the
//! algorithms some live database can actually use. Where the bytes come from
//! is abstracted behind [`DigestSource`]: files on disk ([`FileSource`]),
//! in-memory data ([`BytesSource`]), or, with the `mock` feature, a
//! [`CountingSource`] that records how many digests were computed.

mod algorithm;
mod digest;
pub mod error;
mod probe;
pub mod source;

pub use crate::algorithm::{Algorithm, AlgorithmSet};
pub use crate::digest::{Digest, Digests, MultiHasher};
pub use crate::probe::Probe;
#[cfg(any(test, feature = "mock"))]
pub use crate::source::CountingSource;
pub use crate::source::{BytesSource, DigestSource, FileSource};
