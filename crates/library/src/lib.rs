//! Host-side plumbing around the matching engine: finding candidate
//! databases on disk, loading them into a [`Registry`](othd_hashdb::Registry)
//! and checking many files against it concurrently.

pub mod error;
mod check;
mod discover;
mod load;

pub use crate::check::{CheckEvent, check, check_file};
pub use crate::discover::discover;
pub use crate::load::{Loaded, load_candidates, load_registry};
