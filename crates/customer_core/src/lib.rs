//! Customer records core.
//! This crate is the single source of truth for customer invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::address::{Address, AddressFields};
pub use model::customer::{Customer, CustomerId, CustomerSnapshot};
pub use model::document::{normalize_document_number, Document, DocumentType};
pub use model::email::Email;
pub use model::error::{DomainError, DomainErrorKind, DomainResult};
pub use model::phone::Phone;
pub use repo::customer_repo::{CustomerRepository, RepoError, RepoResult, SqliteCustomerRepository};
pub use repo::memory_repo::InMemoryCustomerRepository;
pub use service::customer_service::{
    CustomerService, DocumentInput, PhoneInput, RegisterCustomerRequest,
};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
