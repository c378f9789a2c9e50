//! Database identity from the header relation.

use crate::db::Database;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use uuid::Uuid;

/// Name of the explicit insertion-order column a header relation may carry.
const SEQUENCE_COLUMN: &str = "seq";

/// Identity of a hash database, taken from its most recent header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Consumers conventionally show at most 63 characters; passed through
    /// untruncated.
    pub name: String,
    /// Consumers conventionally show at most 1023 characters; passed through
    /// untruncated.
    pub description: String,
    pub uuid: Uuid,
}

#[derive(sqlx::FromRow)]
struct HeaderRow {
    name: String,
    description: String,
    uuid: Vec<u8>,
}
impl TryFrom<HeaderRow> for Header {
    type Error = crate::error::Error;
    fn try_from(row: HeaderRow) -> Result<Self> {
        Ok(Self {
            name: row.name,
            description: row.description,
            uuid: Uuid::from_slice(&row.uuid).or_raise(|| ErrorKind::InvalidData("header uuid"))?,
        })
    }
}

/// Read the header of `db`, last-inserted row wins.
///
/// Rowids are not trusted to be monotonic in general, so when the header
/// relation has an explicit `seq` column the row with the greatest `seq`
/// wins. Without one, the rowid is the only insertion-order information the
/// format carries and is used as-is.
///
/// Fails with [`ErrorKind::MissingHeader`] if the header relation is absent
/// or empty, and with [`ErrorKind::InvalidData`] if it exists but cannot be
/// read as a header.
pub async fn read_header(db: &Database) -> Result<Header> {
    let missing = || ErrorKind::MissingHeader(db.path().to_path_buf());
    if !db.table_exists("header").await? {
        exn::bail!(missing());
    }
    let columns = db.table_columns("header").await?;
    let sql = if columns.iter().any(|c| c == SEQUENCE_COLUMN) {
        include_str!("../queries/select_header_sequenced.sql")
    } else {
        include_str!("../queries/select_header.sql")
    };
    let row: Option<HeaderRow> =
        sqlx::query_as(sql).fetch_optional(db.pool()).await.or_raise(|| ErrorKind::InvalidData("header"))?;
    let row = row.ok_or_raise(missing)?;
    Header::try_from(row)
}
