//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the customer data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes run `Customer::validate_for_persistence()` after the document
//!   conflict scan and before anything is stored.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod customer_repo;
pub mod memory_repo;
