//! Read-only hash database matching engine.
//!
//! Decides, as cheaply as possible, whether a file's identity (size plus
//! SHA-1 and/or MD5) is recorded in any of several independently authored
//! OTHD reference databases.
//!
//! # Architecture
//! - **[`Handle`]**: one opened database that passed validation: identity
//!   from the most recent header row ([`read_header`]) and the subset of
//!   {size, sha1, md5} its files relation provides ([`inspect_columns`]).
//! - **[`Registry`]**: every admitted handle, keyed by uuid. A uuid seen on
//!   more than one database is poisoned and all databases carrying it are
//!   excluded. Also derives the [required hashes](Registry::required_hashes).
//! - **Query engine** ([`Handle::query`]): a size-only existence check that
//!   rejects most files without hashing, then a full equality check on every
//!   column the database has.
//! - **Aggregation** ([`Registry::evaluate`]): OR over live handles into a
//!   [`MatchVerdict`].
//!
//! Databases are opened immutable; nothing here ever writes to them.

mod column;
mod db;
mod describe;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod handle;
mod header;
mod query;
mod registry;
mod schema;
mod verdict;

pub use crate::column::{Column, ColumnSet};
pub use crate::db::{DEFAULT_MAX_CONNECTIONS, Database};
pub use crate::describe::{Description, IndexInfo, SampleRow, is_ideal_index};
pub use crate::handle::{APPLICATION_ID, Handle, SUPPORTED_VERSION};
pub use crate::header::{Header, read_header};
pub use crate::registry::{Conflict, ConflictMember, Registry, required_hashes};
pub use crate::schema::inspect_columns;
pub use crate::verdict::{MatchVerdict, Mode};
