//! Hash Database Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Load-phase errors ([`Open`](ErrorKind::Open), [`MissingHeader`](ErrorKind::MissingHeader),
//! [`EmptySchema`](ErrorKind::EmptySchema), [`UuidConflict`](ErrorKind::UuidConflict))
//! only ever exclude the candidate(s) involved; the rest of the load carries
//! on. [`QueryExecution`](ErrorKind::QueryExecution) is per file and must be
//! reported, never read as "no match".

use derive_more::{Display, Error};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A hash database error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for hash database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The candidate could not be opened read-only and immutable (missing,
    /// unreadable, or not a SQLite database at all).
    #[display("could not open database: {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    /// The header relation is absent or has no rows.
    #[display("database has no header: {}", _0.display())]
    MissingHeader(#[error(not(source))] PathBuf),
    /// The files relation exposes none of `size`, `sha1`, `md5`.
    #[display("database has no usable columns: {}", _0.display())]
    EmptySchema(#[error(not(source))] PathBuf),
    /// Two or more candidates carry the same uuid; every one of them is
    /// excluded from matching.
    #[display("uuid {uuid} is shared by {} databases: {}", paths.len(), display_paths(paths))]
    UuidConflict { uuid: Uuid, paths: Vec<PathBuf> },
    /// The same database file was offered for admission twice.
    #[display("database already admitted: {}", _0.display())]
    AlreadyAdmitted(#[error(not(source))] PathBuf),
    /// The storage engine (or the probe feeding it) failed mid-query.
    #[display("query execution failed")]
    QueryExecution,
    /// A stored value could not be interpreted.
    #[display("invalid database data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueryExecution)
    }

    /// Returns `true` for errors that exclude a candidate during the load
    /// phase (as opposed to per-file evaluation errors).
    pub fn is_load_error(&self) -> bool {
        !matches!(self, Self::QueryExecution)
    }

    /// Path of the candidate this error is about, when there is exactly one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Open(p) | Self::MissingHeader(p) | Self::EmptySchema(p) | Self::AlreadyAdmitted(p) => Some(p),
            _ => None,
        }
    }
}
