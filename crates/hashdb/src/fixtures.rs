//! Small OTHD databases authored on disk for tests.
//!
//! The engine never writes to a hash database, so tests need some other way
//! to produce them. [`Fixture`] is a builder that lays out the same schema
//! the authoring tools produce (header relation, files relation with any
//! subset of columns, composite lookup index, metadata tags) plus the odd
//! deliberately broken variant.
//!
//! Failures while authoring panic: if test setup is wrong, the test should
//! not pass.

use crate::{APPLICATION_ID, Column, SUPPORTED_VERSION};
use othd_probe::{AlgorithmSet, MultiHasher};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Executor};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One header row.
#[derive(Clone, Debug)]
pub struct HeaderRow {
    pub name: String,
    pub description: String,
    pub uuid: Vec<u8>,
    /// Explicit SQLite rowid, to simulate row identifiers that don't follow
    /// insertion order.
    pub rowid: Option<i64>,
}

/// One `files` row. Only the values for columns the fixture declares are
/// written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRow {
    pub size: i64,
    pub sha1: Vec<u8>,
    pub md5: Vec<u8>,
}
impl FileRow {
    /// Row describing the given file contents.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = MultiHasher::new(AlgorithmSet::all());
        hasher.update(content);
        let digests = hasher.finish(content.len() as u64).expect("size always matches");
        Self {
            size: i64::try_from(content.len()).expect("fixture content fits in i64"),
            sha1: digests.sha1.expect("sha1 requested").to_vec(),
            md5: digests.md5.expect("md5 requested").to_vec(),
        }
    }
}

/// Builder for a hash database file.
#[derive(Clone, Debug)]
pub struct Fixture {
    headers: Vec<HeaderRow>,
    header_table: bool,
    sequenced: bool,
    columns: Vec<String>,
    rows: Vec<FileRow>,
    index: bool,
    application_id: i64,
    user_version: i64,
}
impl Default for Fixture {
    fn default() -> Self {
        Self::new("Fixture", Uuid::from_u128(1))
    }
}
impl Fixture {
    /// A database with all three columns, one header row, the ideal index and
    /// no file rows.
    pub fn new(name: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            headers: vec![HeaderRow {
                name: name.into(),
                description: String::new(),
                uuid: uuid.as_bytes().to_vec(),
                rowid: None,
            }],
            header_table: true,
            sequenced: false,
            columns: Column::ALL.iter().map(|c| c.name().to_string()).collect(),
            rows: Vec::new(),
            index: true,
            application_id: APPLICATION_ID,
            user_version: SUPPORTED_VERSION,
        }
    }

    /// Set the description of the most recently added header row.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        if let Some(header) = self.headers.last_mut() {
            header.description = description.into();
        }
        self
    }

    /// Append another header row (inserted after all previous ones).
    pub fn header(mut self, name: impl Into<String>, description: impl Into<String>, uuid: Uuid) -> Self {
        self.headers.push(HeaderRow {
            name: name.into(),
            description: description.into(),
            uuid: uuid.as_bytes().to_vec(),
            rowid: None,
        });
        self
    }

    /// Replace all header rows.
    pub fn headers(mut self, headers: impl IntoIterator<Item = HeaderRow>) -> Self {
        self.headers = headers.into_iter().collect();
        self
    }

    /// Give the header relation an explicit `seq` insertion-order column.
    pub fn sequenced(mut self) -> Self {
        self.sequenced = true;
        self
    }

    /// Leave out the header relation entirely.
    pub fn without_header_table(mut self) -> Self {
        self.header_table = false;
        self
    }

    /// Declare which known columns the files relation has.
    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns = columns.into_iter().map(|c| c.name().to_string()).collect();
        self
    }

    /// Declare arbitrary (possibly unknown) column names for the files relation.
    pub fn raw_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn row(mut self, row: FileRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Add a row describing the given file contents.
    pub fn content(self, content: &[u8]) -> Self {
        self.row(FileRow::from_content(content))
    }

    pub fn without_index(mut self) -> Self {
        self.index = false;
        self
    }

    pub fn application_id(mut self, application_id: i64) -> Self {
        self.application_id = application_id;
        self
    }

    pub fn user_version(mut self, user_version: i64) -> Self {
        self.user_version = user_version;
        self
    }

    /// Write the database to `path` and return the path.
    pub async fn build(self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.expect("create fixture database");
        self.populate(&mut conn).await.expect("populate fixture database");
        conn.close().await.expect("close fixture database");
        path
    }

    async fn populate(&self, conn: &mut SqliteConnection) -> sqlx::Result<()> {
        conn.execute(format!("PRAGMA application_id = {}", self.application_id).as_str()).await?;
        conn.execute(format!("PRAGMA user_version = {}", self.user_version).as_str()).await?;

        if self.header_table {
            let seq = if self.sequenced { ", seq INTEGER NOT NULL" } else { "" };
            conn.execute(
                format!("CREATE TABLE header (name TEXT NOT NULL, description TEXT NOT NULL, uuid BLOB NOT NULL{seq})")
                    .as_str(),
            )
            .await?;
            for (position, header) in self.headers.iter().enumerate() {
                let sql = match (header.rowid.is_some(), self.sequenced) {
                    (true, true) => "INSERT INTO header (name, description, uuid, rowid, seq) VALUES (?, ?, ?, ?, ?)",
                    (true, false) => "INSERT INTO header (name, description, uuid, rowid) VALUES (?, ?, ?, ?)",
                    (false, true) => "INSERT INTO header (name, description, uuid, seq) VALUES (?, ?, ?, ?)",
                    (false, false) => "INSERT INTO header (name, description, uuid) VALUES (?, ?, ?)",
                };
                let mut query = sqlx::query(sql).bind(&header.name).bind(&header.description).bind(&header.uuid);
                if let Some(rowid) = header.rowid {
                    query = query.bind(rowid);
                }
                if self.sequenced {
                    query = query.bind(i64::try_from(position).unwrap_or(i64::MAX) + 1);
                }
                query.execute(&mut *conn).await?;
            }
        }

        let definitions: Vec<String> = self
            .columns
            .iter()
            .map(|name| match Column::from_name(name) {
                Some(Column::Size) => format!("{name} INT NOT NULL"),
                Some(_) => format!("{name} BLOB NOT NULL"),
                None => format!("{name} TEXT"),
            })
            .collect();
        conn.execute(format!("CREATE TABLE files ({})", definitions.join(", ")).as_str()).await?;

        let known: Vec<Column> = Column::ALL.into_iter().filter(|c| self.columns.iter().any(|n| n == c.name())).collect();
        if self.index && !known.is_empty() {
            let names: Vec<&str> = known.iter().map(|c| c.name()).collect();
            conn.execute(format!("CREATE INDEX files_lookup ON files ({})", names.join(", ")).as_str()).await?;
        }
        if !known.is_empty() {
            let names: Vec<&str> = known.iter().map(|c| c.name()).collect();
            let placeholders = vec!["?"; known.len()].join(", ");
            let sql = format!("INSERT INTO files ({}) VALUES ({placeholders})", names.join(", "));
            for row in &self.rows {
                let mut query = sqlx::query(&sql);
                for column in &known {
                    query = match column {
                        Column::Size => query.bind(row.size),
                        Column::Sha1 => query.bind(row.sha1.clone()),
                        Column::Md5 => query.bind(row.md5.clone()),
                    };
                }
                query.execute(&mut *conn).await?;
            }
        }
        Ok(())
    }
}

/// Shorthand for a header row with an explicit rowid.
pub fn header_row(name: &str, uuid: Uuid, rowid: i64) -> HeaderRow {
    HeaderRow {
        name: name.to_string(),
        description: String::new(),
        uuid: uuid.as_bytes().to_vec(),
        rowid: Some(rowid),
    }
}
