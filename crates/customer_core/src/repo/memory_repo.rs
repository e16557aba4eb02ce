//! Process-local customer repository.
//!
//! # Invariants
//! - One mutex guards the whole collection; every operation holds it from
//!   check to write, so concurrent adds with the same document cannot both win.
//! - Stored and returned customers are clones; callers never alias storage.
//! - `get_all` returns insertion order.

use crate::model::customer::{Customer, CustomerId};
use crate::model::document::normalize_document_number;
use crate::repo::customer_repo::{CustomerRepository, RepoError, RepoResult};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct InMemoryCustomerRepository {
    customers: Mutex<Vec<Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn customers(&self) -> MutexGuard<'_, Vec<Customer>> {
        // A panicking writer never leaves a half-applied customer behind.
        self.customers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CustomerRepository for InMemoryCustomerRepository {
    fn add(&self, customer: &Customer) -> RepoResult<()> {
        let mut customers = self.customers();
        if let Some(document_number) = first_taken_document(&customers, customer, None) {
            warn!(
                "event=customer_add module=repo status=conflict customer_id={}",
                customer.id()
            );
            return Err(RepoError::Conflict { document_number });
        }
        customer.validate_for_persistence()?;
        if customers.iter().any(|stored| stored.id() == customer.id()) {
            return Err(RepoError::InvalidData(format!(
                "customer already stored: {}",
                customer.id()
            )));
        }

        customers.push(customer.clone());
        info!(
            "event=customer_add module=repo status=ok customer_id={} documents={}",
            customer.id(),
            customer.documents().len()
        );
        Ok(())
    }

    fn update(&self, customer: &Customer) -> RepoResult<()> {
        let mut customers = self.customers();
        let Some(index) = customers
            .iter()
            .position(|stored| stored.id() == customer.id())
        else {
            return Err(RepoError::NotFound(customer.id()));
        };
        if let Some(document_number) =
            first_taken_document(&customers, customer, Some(customer.id()))
        {
            warn!(
                "event=customer_update module=repo status=conflict customer_id={}",
                customer.id()
            );
            return Err(RepoError::Conflict { document_number });
        }
        customer.validate_for_persistence()?;

        customers[index] = customer.clone();
        info!(
            "event=customer_update module=repo status=ok customer_id={}",
            customer.id()
        );
        Ok(())
    }

    fn delete(&self, id: CustomerId) -> RepoResult<()> {
        let mut customers = self.customers();
        let Some(index) = customers.iter().position(|stored| stored.id() == id) else {
            return Err(RepoError::NotFound(id));
        };
        customers.remove(index);
        info!("event=customer_delete module=repo status=ok customer_id={id}");
        Ok(())
    }

    fn get_by_id(&self, id: CustomerId) -> RepoResult<Option<Customer>> {
        Ok(self
            .customers()
            .iter()
            .find(|stored| stored.id() == id)
            .cloned())
    }

    fn get_by_document(&self, number: &str) -> RepoResult<Option<Customer>> {
        let number = normalize_document_number(number);
        Ok(self
            .customers()
            .iter()
            .find(|stored| owns_document(stored, &number))
            .cloned())
    }

    fn get_all(&self) -> RepoResult<Vec<Customer>> {
        Ok(self.customers().to_vec())
    }

    fn document_exists(&self, number: &str) -> RepoResult<bool> {
        let number = normalize_document_number(number);
        Ok(self
            .customers()
            .iter()
            .any(|stored| owns_document(stored, &number)))
    }

    fn customer_exists(&self, id: CustomerId) -> RepoResult<bool> {
        Ok(self.customers().iter().any(|stored| stored.id() == id))
    }
}

/// First document of `customer` already held by a stored customer other than
/// `exclude`.
fn first_taken_document(
    stored: &[Customer],
    customer: &Customer,
    exclude: Option<CustomerId>,
) -> Option<String> {
    customer
        .documents()
        .iter()
        .map(|document| document.number())
        .find(|number| {
            stored
                .iter()
                .filter(|other| Some(other.id()) != exclude)
                .any(|other| owns_document(other, number))
        })
        .map(str::to_string)
}

fn owns_document(customer: &Customer, number: &str) -> bool {
    customer
        .documents()
        .iter()
        .any(|document| document.number() == number)
}
