//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from `othd-hashdb` and
//! `othd-probe` become children of these.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Loading finished without a single usable database and the host
    /// requires one.
    #[display("no usable hash database was loaded")]
    NoDatabases,
    /// The file to check could not be probed (missing, unreadable).
    #[display("could not probe file: {}", _0.display())]
    Probe(#[error(not(source))] PathBuf),
    /// A database query failed while evaluating the file.
    #[display("could not evaluate file: {}", _0.display())]
    Evaluate(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Evaluate(_))
    }

    /// The file this error is about, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Probe(p) | Self::Evaluate(p) => Some(p),
            Self::NoDatabases => None,
        }
    }
}
