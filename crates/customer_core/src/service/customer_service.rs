//! Customer use-case service.
//!
//! # Responsibility
//! - Build complete customers from registration input and store them.
//! - Run load → mutate → update cycles against any repository.
//!
//! # Invariants
//! - A failed mutation is never written back.
//! - The first entry of every registration list becomes the primary one.

use crate::model::address::AddressFields;
use crate::model::customer::{Customer, CustomerId};
use crate::model::document::Document;
use crate::model::error::DomainResult;
use crate::repo::customer_repo::{CustomerRepository, RepoError, RepoResult};
use log::info;

/// Phone input as `(area_code, number)` parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneInput {
    pub area_code: String,
    pub number: String,
}

/// Document input as raw number plus type code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInput {
    pub number: String,
    pub kind: String,
}

/// Everything needed to register a customer in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub emails: Vec<String>,
    pub phones: Vec<PhoneInput>,
    pub addresses: Vec<AddressFields>,
    pub documents: Vec<DocumentInput>,
}

/// Customer service facade over repository implementations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Builds a customer from `request` and adds it to the repository.
    ///
    /// # Errors
    /// - `Domain` for the first invalid field, in request order.
    /// - `Conflict` when any document is already owned by another customer.
    /// - `Domain` (invariant) when a required list is empty.
    pub fn register_customer(&self, request: &RegisterCustomerRequest) -> RepoResult<Customer> {
        let mut customer = Customer::create(&request.name)?;
        for (index, email) in request.emails.iter().enumerate() {
            customer.add_email(email, index == 0)?;
        }
        for (index, phone) in request.phones.iter().enumerate() {
            customer.add_phone(&phone.area_code, &phone.number, index == 0)?;
        }
        for (index, address) in request.addresses.iter().enumerate() {
            customer.add_address(address.clone(), index == 0)?;
        }
        for document in &request.documents {
            customer.add_document(Document::create(&document.number, &document.kind)?)?;
        }

        self.repo.add(&customer)?;
        info!(
            "event=customer_register module=service status=ok customer_id={}",
            customer.id()
        );
        Ok(customer)
    }

    pub fn get_customer(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        self.repo.get_by_id(id)
    }

    pub fn find_by_document(&self, number: &str) -> RepoResult<Option<Customer>> {
        self.repo.get_by_document(number)
    }

    pub fn list_customers(&self) -> RepoResult<Vec<Customer>> {
        self.repo.get_all()
    }

    /// Loads `id`, applies `mutate`, and writes the result back.
    ///
    /// # Errors
    /// - `NotFound` when no customer has this id.
    /// - `Domain` when `mutate` fails; nothing is written in that case.
    /// - Any error from `update`.
    pub fn modify_customer<T, F>(&self, id: CustomerId, mutate: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Customer) -> DomainResult<T>,
    {
        let mut customer = self.repo.get_by_id(id)?.ok_or(RepoError::NotFound(id))?;
        let output = mutate(&mut customer)?;
        self.repo.update(&customer)?;
        Ok(output)
    }

    pub fn rename_customer(&self, id: CustomerId, new_name: &str) -> RepoResult<Customer> {
        self.modify_customer(id, |customer| {
            customer.update_name(new_name)?;
            Ok(customer.clone())
        })
    }

    pub fn activate_customer(&self, id: CustomerId) -> RepoResult<Customer> {
        self.modify_customer(id, |customer| {
            customer.activate()?;
            Ok(customer.clone())
        })
    }

    pub fn deactivate_customer(&self, id: CustomerId) -> RepoResult<Customer> {
        self.modify_customer(id, |customer| {
            customer.deactivate()?;
            Ok(customer.clone())
        })
    }

    pub fn delete_customer(&self, id: CustomerId) -> RepoResult<()> {
        self.repo.delete(id)
    }
}
