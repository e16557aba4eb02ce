//! Customer domain model.
//!
//! # Responsibility
//! - Define self-validating value objects for contact channels and documents.
//! - Define the `Customer` aggregate, the single unit of consistency.
//!
//! # Invariants
//! - Value objects are only built through their validating `create` factories.
//! - External code mutates customers only through aggregate methods.

pub mod address;
pub mod customer;
pub mod document;
pub mod email;
pub mod error;
pub mod phone;
