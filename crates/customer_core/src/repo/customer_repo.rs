//! Customer repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Enforce document-number uniqueness across all stored customers.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `add` checks document conflicts, then `validate_for_persistence`, then
//!   commits. `update` additionally fails with `NotFound` first.
//! - Every write runs in one `IMMEDIATE` transaction, so the uniqueness check
//!   and the write are atomic with respect to other writers.
//! - Every multi-statement read runs in one `DEFERRED` transaction, so a
//!   customer and its collections come from the same committed state.
//! - Read paths rebuild customers through validating factories and reject
//!   invalid persisted state instead of masking it.
//! - Reads return detached snapshots; nothing is written back implicitly.

use crate::db::migrations::{ensure_schema_ready, COLLECTION_TABLES};
use crate::db::DbError;
use crate::model::address::{Address, AddressFields};
use crate::model::customer::{Customer, CustomerId, CustomerSnapshot};
use crate::model::document::{normalize_document_number, Document};
use crate::model::email::Email;
use crate::model::error::DomainError;
use crate::model::phone::Phone;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for customer persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    /// The aggregate rejected the operation or failed its persistence check.
    Domain(DomainError),
    /// A document number on the incoming customer belongs to another customer.
    Conflict { document_number: String },
    /// No customer with this id is stored.
    NotFound(CustomerId),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Persisted or incoming data cannot form a valid customer.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(err) => write!(f, "{err}"),
            Self::Conflict { document_number } => write!(
                f,
                "document `{document_number}` is already used by another customer"
            ),
            Self::NotFound(id) => write!(f, "customer not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid customer data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "customer repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "customer repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Domain(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Conflict { .. }
            | Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DomainError> for RepoError {
    fn from(value: DomainError) -> Self {
        Self::Domain(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for customer aggregates.
pub trait CustomerRepository {
    /// Stores a new customer after conflict and completeness checks.
    fn add(&self, customer: &Customer) -> RepoResult<()>;
    /// Replaces the stored version of an existing customer.
    fn update(&self, customer: &Customer) -> RepoResult<()>;
    /// Removes a customer; unknown ids fail with `NotFound`.
    fn delete(&self, id: CustomerId) -> RepoResult<()>;
    fn get_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>>;
    /// Finds the customer owning `number` (normalized to digits first).
    fn get_by_document(&self, number: &str) -> RepoResult<Option<Customer>>;
    fn get_all(&self) -> RepoResult<Vec<Customer>>;
    fn document_exists(&self, number: &str) -> RepoResult<bool>;
    fn customer_exists(&self, id: CustomerId) -> RepoResult<bool>;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Creates a repository over a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    /// - `MissingRequiredTable` when a customer table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_customer_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin_write(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn begin_read(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Deferred,
        )?)
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn add(&self, customer: &Customer) -> RepoResult<()> {
        let tx = self.begin_write()?;
        if let Some(document_number) = first_taken_document(&tx, customer, None)? {
            warn!(
                "event=customer_add module=repo status=conflict customer_id={}",
                customer.id()
            );
            return Err(RepoError::Conflict { document_number });
        }
        customer.validate_for_persistence()?;
        if customer_row_exists(&tx, customer.id())? {
            return Err(RepoError::InvalidData(format!(
                "customer already stored: {}",
                customer.id()
            )));
        }

        let uuid = customer.id().to_string();
        tx.execute(
            "INSERT INTO customers (uuid, name, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                uuid,
                customer.name(),
                bool_to_int(customer.is_active()),
                customer.created_at(),
                customer.updated_at(),
            ],
        )?;
        insert_collections(&tx, &uuid, customer)?;
        tx.commit()?;

        info!(
            "event=customer_add module=repo status=ok customer_id={} documents={}",
            uuid,
            customer.documents().len()
        );
        Ok(())
    }

    fn update(&self, customer: &Customer) -> RepoResult<()> {
        let tx = self.begin_write()?;
        if !customer_row_exists(&tx, customer.id())? {
            return Err(RepoError::NotFound(customer.id()));
        }
        if let Some(document_number) = first_taken_document(&tx, customer, Some(customer.id()))? {
            warn!(
                "event=customer_update module=repo status=conflict customer_id={}",
                customer.id()
            );
            return Err(RepoError::Conflict { document_number });
        }
        customer.validate_for_persistence()?;

        let uuid = customer.id().to_string();
        tx.execute(
            "UPDATE customers
             SET
                name = ?2,
                is_active = ?3,
                created_at = ?4,
                updated_at = ?5
             WHERE uuid = ?1;",
            params![
                uuid,
                customer.name(),
                bool_to_int(customer.is_active()),
                customer.created_at(),
                customer.updated_at(),
            ],
        )?;
        delete_collections(&tx, &uuid)?;
        insert_collections(&tx, &uuid, customer)?;
        tx.commit()?;

        info!("event=customer_update module=repo status=ok customer_id={uuid}");
        Ok(())
    }

    fn delete(&self, id: CustomerId) -> RepoResult<()> {
        let tx = self.begin_write()?;
        let uuid = id.to_string();
        delete_collections(&tx, &uuid)?;
        let changed = tx.execute("DELETE FROM customers WHERE uuid = ?1;", [&uuid])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;

        info!("event=customer_delete module=repo status=ok customer_id={uuid}");
        Ok(())
    }

    fn get_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        let tx = self.begin_read()?;
        let customer = load_customer(&tx, &id.to_string())?;
        tx.commit()?;
        Ok(customer)
    }

    fn get_by_document(&self, number: &str) -> RepoResult<Option<Customer>> {
        let tx = self.begin_read()?;
        let uuid: Option<String> = tx
            .query_row(
                "SELECT customer_uuid
                 FROM customer_documents
                 WHERE number = ?1
                 ORDER BY rowid ASC
                 LIMIT 1;",
                [normalize_document_number(number)],
                |row| row.get(0),
            )
            .optional()?;

        let customer = match uuid {
            Some(uuid) => load_customer(&tx, &uuid)?,
            None => None,
        };
        tx.commit()?;
        Ok(customer)
    }

    fn get_all(&self) -> RepoResult<Vec<Customer>> {
        let tx = self.begin_read()?;
        let uuids = {
            let mut stmt =
                tx.prepare("SELECT uuid FROM customers ORDER BY created_at ASC, uuid ASC;")?;
            let uuids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            uuids
        };

        let mut customers = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            if let Some(customer) = load_customer(&tx, &uuid)? {
                customers.push(customer);
            }
        }
        tx.commit()?;
        Ok(customers)
    }

    fn document_exists(&self, number: &str) -> RepoResult<bool> {
        document_taken(self.conn, &normalize_document_number(number), None)
    }

    fn customer_exists(&self, id: CustomerId) -> RepoResult<bool> {
        customer_row_exists(self.conn, id)
    }
}

fn first_taken_document(
    conn: &Connection,
    customer: &Customer,
    exclude: Option<CustomerId>,
) -> RepoResult<Option<String>> {
    for document in customer.documents() {
        if document_taken(conn, document.number(), exclude)? {
            return Ok(Some(document.number().to_string()));
        }
    }
    Ok(None)
}

fn document_taken(
    conn: &Connection,
    number: &str,
    exclude: Option<CustomerId>,
) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM customer_documents
            WHERE number = ?1
              AND (?2 IS NULL OR customer_uuid <> ?2)
        );",
        params![number, exclude.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn customer_row_exists(conn: &Connection, id: CustomerId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn insert_collections(tx: &Transaction<'_>, uuid: &str, customer: &Customer) -> RepoResult<()> {
    for (position, email) in customer.emails().iter().enumerate() {
        tx.execute(
            "INSERT INTO customer_emails (customer_uuid, position, value, is_primary)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                uuid,
                position as i64,
                email.value(),
                bool_to_int(email.is_primary())
            ],
        )?;
    }

    for (position, phone) in customer.phones().iter().enumerate() {
        tx.execute(
            "INSERT INTO customer_phones (customer_uuid, position, area_code, number, is_primary)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                uuid,
                position as i64,
                phone.area_code(),
                phone.number(),
                bool_to_int(phone.is_primary())
            ],
        )?;
    }

    for (position, address) in customer.addresses().iter().enumerate() {
        tx.execute(
            "INSERT INTO customer_addresses (
                customer_uuid,
                position,
                street,
                number,
                complement,
                city,
                state,
                zip_code,
                country,
                is_primary
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                uuid,
                position as i64,
                address.street(),
                address.number(),
                address.complement(),
                address.city(),
                address.state(),
                address.zip_code(),
                address.country(),
                bool_to_int(address.is_primary())
            ],
        )?;
    }

    for (position, document) in customer.documents().iter().enumerate() {
        tx.execute(
            "INSERT INTO customer_documents (customer_uuid, position, number, type)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                uuid,
                position as i64,
                document.number(),
                document.kind().as_str()
            ],
        )?;
    }

    Ok(())
}

fn delete_collections(tx: &Transaction<'_>, uuid: &str) -> RepoResult<()> {
    for table in COLLECTION_TABLES {
        tx.execute(
            &format!("DELETE FROM {table} WHERE customer_uuid = ?1;"),
            [uuid],
        )?;
    }
    Ok(())
}

fn load_customer(conn: &Connection, uuid: &str) -> RepoResult<Option<Customer>> {
    let row = conn
        .query_row(
            "SELECT uuid, name, is_active, created_at, updated_at
             FROM customers
             WHERE uuid = ?1;",
            [uuid],
            |row| {
                Ok((
                    row.get::<_, String>("uuid")?,
                    row.get::<_, String>("name")?,
                    row.get::<_, i64>("is_active")?,
                    row.get::<_, i64>("created_at")?,
                    row.get::<_, i64>("updated_at")?,
                ))
            },
        )
        .optional()?;

    let Some((uuid_text, name, is_active, created_at, updated_at)) = row else {
        return Ok(None);
    };

    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in customers.uuid"))
    })?;

    let snapshot = CustomerSnapshot {
        id,
        name,
        emails: load_emails(conn, &uuid_text)?,
        phones: load_phones(conn, &uuid_text)?,
        addresses: load_addresses(conn, &uuid_text)?,
        documents: load_documents(conn, &uuid_text)?,
        created_at,
        updated_at,
        is_active: int_to_bool(is_active, "customers.is_active")?,
    };
    Customer::restore(snapshot)
        .map(Some)
        .map_err(|err| persisted_invalid(&err))
}

fn load_emails(conn: &Connection, uuid: &str) -> RepoResult<Vec<Email>> {
    let mut stmt = conn.prepare(
        "SELECT value, is_primary
         FROM customer_emails
         WHERE customer_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([uuid])?;
    let mut emails = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get("value")?;
        let is_primary = int_to_bool(row.get("is_primary")?, "customer_emails.is_primary")?;
        emails.push(Email::create(value, is_primary).map_err(|err| persisted_invalid(&err))?);
    }
    Ok(emails)
}

fn load_phones(conn: &Connection, uuid: &str) -> RepoResult<Vec<Phone>> {
    let mut stmt = conn.prepare(
        "SELECT area_code, number, is_primary
         FROM customer_phones
         WHERE customer_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([uuid])?;
    let mut phones = Vec::new();
    while let Some(row) = rows.next()? {
        let area_code: String = row.get("area_code")?;
        let number: String = row.get("number")?;
        let is_primary = int_to_bool(row.get("is_primary")?, "customer_phones.is_primary")?;
        phones.push(
            Phone::create(area_code, number, is_primary).map_err(|err| persisted_invalid(&err))?,
        );
    }
    Ok(phones)
}

fn load_addresses(conn: &Connection, uuid: &str) -> RepoResult<Vec<Address>> {
    let mut stmt = conn.prepare(
        "SELECT street, number, complement, city, state, zip_code, country, is_primary
         FROM customer_addresses
         WHERE customer_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([uuid])?;
    let mut addresses = Vec::new();
    while let Some(row) = rows.next()? {
        let fields = AddressFields {
            street: row.get("street")?,
            number: row.get("number")?,
            complement: row.get("complement")?,
            city: row.get("city")?,
            state: row.get("state")?,
            zip_code: row.get("zip_code")?,
            country: row.get("country")?,
        };
        let is_primary = int_to_bool(row.get("is_primary")?, "customer_addresses.is_primary")?;
        addresses.push(Address::create(fields, is_primary).map_err(|err| persisted_invalid(&err))?);
    }
    Ok(addresses)
}

fn load_documents(conn: &Connection, uuid: &str) -> RepoResult<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT number, type
         FROM customer_documents
         WHERE customer_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([uuid])?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next()? {
        let number: String = row.get("number")?;
        let kind: String = row.get("type")?;
        documents.push(Document::restore(number, &kind).map_err(|err| persisted_invalid(&err))?);
    }
    Ok(documents)
}

fn persisted_invalid(err: &DomainError) -> RepoError {
    RepoError::InvalidData(err.to_string())
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_customer_connection_ready(conn: &Connection) -> RepoResult<()> {
    ensure_schema_ready(conn).map_err(|err| match err {
        DbError::SchemaVersionMismatch { expected, actual } => RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        },
        DbError::MissingTable(table) => RepoError::MissingRequiredTable(table),
        other => RepoError::Db(other),
    })
}
