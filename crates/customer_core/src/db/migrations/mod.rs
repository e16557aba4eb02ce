//! Customer schema migrations and readiness check.
//!
//! # Invariants
//! - `MIGRATIONS` is ordered by strictly increasing `version`.
//! - A migration run commits as one transaction, `user_version` bumps included.
//! - `CUSTOMERS_TABLE` holds one row per customer. Each entry of
//!   `COLLECTION_TABLES` holds one row per element keyed by
//!   `(customer_uuid, position)`, so element order survives a round-trip.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

pub const CUSTOMERS_TABLE: &str = "customers";

/// Element tables, in the order an aggregate's collections are written.
pub const COLLECTION_TABLES: [&str; 4] = [
    "customer_emails",
    "customer_phones",
    "customer_addresses",
    "customer_documents",
];

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "0001_customers",
    sql: include_str!("0001_customers.sql"),
}];

/// Returns the customer schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version recorded on `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is ahead of this build.
/// - `Migration` naming the first script that failed; the run is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        tx.execute_batch(migration.sql)
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        tx.pragma_update(None, "user_version", migration.version)?;
        info!(
            "event=db_migrate module=db status=applied migration={} version={}",
            migration.name, migration.version
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={latest}"
    );
    Ok(())
}

/// Checks that `conn` is at the latest version with every customer table.
///
/// # Errors
/// - `SchemaVersionMismatch` when `user_version` differs from `latest_version()`.
/// - `MissingTable` naming the first absent table, parent table first.
pub fn ensure_schema_ready(conn: &Connection) -> DbResult<()> {
    let expected = latest_version();
    let actual = schema_version(conn)?;
    if actual != expected {
        return Err(DbError::SchemaVersionMismatch { expected, actual });
    }

    for table in std::iter::once(CUSTOMERS_TABLE).chain(COLLECTION_TABLES) {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
