//! SQLite storage for customer records.
//!
//! # Responsibility
//! - Open connections configured for customer storage.
//! - Own the customer schema: its migrations and the readiness check that
//!   repositories run before touching a connection.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A connection is ready only at the latest version with every customer
//!   table present.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Customer storage failure.
#[derive(Debug)]
pub enum DbError {
    /// Driver-level failure.
    Sqlite(rusqlite::Error),
    /// Database was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A registered migration failed; nothing from the run was committed.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Connection is not at the schema version this build writes.
    SchemaVersionMismatch { expected: u32, actual: u32 },
    /// A customer table is absent although the version says it should exist.
    MissingTable(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "customer schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "customer migration {version} ({name}) failed: {source}"),
            Self::SchemaVersionMismatch { expected, actual } => write!(
                f,
                "customer schema version {actual} does not match expected {expected}"
            ),
            Self::MissingTable(table) => write!(f, "customer table `{table}` is missing"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. }
            | Self::SchemaVersionMismatch { .. }
            | Self::MissingTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
