//! Customer aggregate root.
//!
//! # Responsibility
//! - Own the four embedded collections (emails, phones, addresses, documents).
//! - Enforce every intra-aggregate invariant synchronously on each mutation.
//!
//! # Invariants
//! - No collection holds two structurally-equal elements.
//! - At most one element per contact collection is primary at any time.
//! - `name` is trimmed and at least 3 characters long.
//! - The last email, phone or address can never be removed.
//! - A failed mutation leaves the aggregate untouched, `updated_at` included.
//! - Collections are rebuilt wholesale; elements are never mutated in place.

use crate::model::address::{Address, AddressFields};
use crate::model::document::{normalize_document_number, Document};
use crate::model::email::Email;
use crate::model::error::{DomainError, DomainResult};
use crate::model::phone::Phone;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable customer identifier.
pub type CustomerId = Uuid;

const MIN_NAME_CHARS: usize = 3;

/// Contact value objects that carry a per-collection primary marker.
pub trait PrimaryFlag: Clone {
    fn is_primary(&self) -> bool;
    fn with_primary(&self, is_primary: bool) -> Self;
}

impl PrimaryFlag for Email {
    fn is_primary(&self) -> bool {
        Email::is_primary(self)
    }

    fn with_primary(&self, is_primary: bool) -> Self {
        Email::with_primary(self, is_primary)
    }
}

impl PrimaryFlag for Phone {
    fn is_primary(&self) -> bool {
        Phone::is_primary(self)
    }

    fn with_primary(&self, is_primary: bool) -> Self {
        Phone::with_primary(self, is_primary)
    }
}

impl PrimaryFlag for Address {
    fn is_primary(&self) -> bool {
        Address::is_primary(self)
    }

    fn with_primary(&self, is_primary: bool) -> Self {
        Address::with_primary(self, is_primary)
    }
}

/// Persisted customer state handed to [`Customer::restore`].
#[derive(Debug, Clone)]
pub struct CustomerSnapshot {
    pub id: CustomerId,
    pub name: String,
    pub emails: Vec<Email>,
    pub phones: Vec<Phone>,
    pub addresses: Vec<Address>,
    pub documents: Vec<Document>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    emails: Vec<Email>,
    phones: Vec<Phone>,
    addresses: Vec<Address>,
    documents: Vec<Document>,
    created_at: i64,
    updated_at: i64,
    is_active: bool,
}

impl Customer {
    /// Creates an active customer with a fresh id and empty collections.
    ///
    /// # Errors
    /// - `Validation` when the trimmed name is shorter than 3 characters.
    pub fn create(name: &str) -> DomainResult<Self> {
        let name = validate_name(name)?;
        let now = now_epoch_ms();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            emails: Vec::new(),
            phones: Vec::new(),
            addresses: Vec::new(),
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
            is_active: true,
        })
    }

    /// Rebuilds a customer from persisted state.
    ///
    /// Used by repository read paths. Value objects inside the snapshot are
    /// already validated by their own factories; this checks the
    /// aggregate-level rules on top.
    ///
    /// # Errors
    /// - `Validation` for a nil id or an invalid name.
    /// - `Invariant` for duplicate elements or more than one primary.
    pub fn restore(snapshot: CustomerSnapshot) -> DomainResult<Self> {
        if snapshot.id.is_nil() {
            return Err(DomainError::validation("customer id cannot be nil"));
        }
        let name = validate_name(&snapshot.name)?;

        ensure_restorable(&snapshot.emails, "emails")?;
        ensure_restorable(&snapshot.phones, "phones")?;
        ensure_restorable(&snapshot.addresses, "addresses")?;
        if has_duplicates(&snapshot.documents) {
            return Err(DomainError::invariant("customer has duplicate documents"));
        }

        Ok(Self {
            id: snapshot.id,
            name,
            emails: snapshot.emails,
            phones: snapshot.phones,
            addresses: snapshot.addresses,
            documents: snapshot.documents,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            is_active: snapshot.is_active,
        })
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn primary_email(&self) -> Option<&Email> {
        self.emails.iter().find(|email| email.is_primary())
    }

    pub fn primary_phone(&self) -> Option<&Phone> {
        self.phones.iter().find(|phone| phone.is_primary())
    }

    pub fn primary_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|address| address.is_primary())
    }

    /// Unix epoch milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Unix epoch milliseconds. Never decreases.
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn update_name(&mut self, new_name: &str) -> DomainResult<()> {
        self.name = validate_name(new_name)?;
        self.touch();
        Ok(())
    }

    /// Appends an email. A primary newcomer demotes the previous primary.
    ///
    /// # Errors
    /// - `Validation` for a malformed value (checked before duplicates).
    /// - `Duplicate` when the value exists, ignoring case.
    pub fn add_email(&mut self, value: &str, is_primary: bool) -> DomainResult<()> {
        let email = Email::create(value, is_primary)?;
        if self.emails.contains(&email) {
            return Err(DomainError::duplicate(format!(
                "email `{value}` already exists for this customer"
            )));
        }

        self.emails = appended(&self.emails, email);
        self.touch();
        Ok(())
    }

    pub fn remove_email(&mut self, value: &str) -> DomainResult<()> {
        let index = self
            .emails
            .iter()
            .position(|email| email.matches(value))
            .ok_or_else(|| DomainError::not_found(format!("email `{value}` not found")))?;
        if self.emails.len() == 1 {
            return Err(DomainError::invariant(
                "cannot remove the last email of a customer",
            ));
        }

        self.emails = removed(&self.emails, index);
        self.touch();
        Ok(())
    }

    pub fn set_primary_email(&mut self, value: &str) -> DomainResult<()> {
        let index = self
            .emails
            .iter()
            .position(|email| email.matches(value))
            .ok_or_else(|| DomainError::not_found(format!("email `{value}` not found")))?;
        if self.emails[index].is_primary() {
            return Ok(());
        }

        self.emails = promoted(&self.emails, index);
        self.touch();
        Ok(())
    }

    /// Appends a phone. A primary newcomer demotes the previous primary.
    ///
    /// # Errors
    /// - `Validation` for malformed digits.
    /// - `Duplicate` when `(area_code, number)` exists.
    pub fn add_phone(
        &mut self,
        area_code: &str,
        number: &str,
        is_primary: bool,
    ) -> DomainResult<()> {
        let phone = Phone::create(area_code, number, is_primary)?;
        if self.phones.contains(&phone) {
            return Err(DomainError::duplicate(format!(
                "phone `{phone}` already exists for this customer"
            )));
        }

        self.phones = appended(&self.phones, phone);
        self.touch();
        Ok(())
    }

    pub fn remove_phone(&mut self, area_code: &str, number: &str) -> DomainResult<()> {
        let index = self.phone_position(area_code, number)?;
        if self.phones.len() == 1 {
            return Err(DomainError::invariant(
                "cannot remove the last phone of a customer",
            ));
        }

        self.phones = removed(&self.phones, index);
        self.touch();
        Ok(())
    }

    pub fn set_primary_phone(&mut self, area_code: &str, number: &str) -> DomainResult<()> {
        let index = self.phone_position(area_code, number)?;
        if self.phones[index].is_primary() {
            return Ok(());
        }

        self.phones = promoted(&self.phones, index);
        self.touch();
        Ok(())
    }

    /// Appends an address. A primary newcomer demotes the previous primary.
    ///
    /// # Errors
    /// - `Validation` naming the first blank required field.
    /// - `Duplicate` when a structurally-equal address exists.
    pub fn add_address(&mut self, fields: AddressFields, is_primary: bool) -> DomainResult<()> {
        let address = Address::create(fields, is_primary)?;
        if self.addresses.contains(&address) {
            return Err(DomainError::duplicate(format!(
                "address `{address}` already exists for this customer"
            )));
        }

        self.addresses = appended(&self.addresses, address);
        self.touch();
        Ok(())
    }

    pub fn remove_address(&mut self, street: &str, number: &str, city: &str) -> DomainResult<()> {
        let index = self.address_position(street, number, city)?;
        if self.addresses.len() == 1 {
            return Err(DomainError::invariant(
                "cannot remove the last address of a customer",
            ));
        }

        self.addresses = removed(&self.addresses, index);
        self.touch();
        Ok(())
    }

    pub fn set_primary_address(
        &mut self,
        street: &str,
        number: &str,
        city: &str,
    ) -> DomainResult<()> {
        let index = self.address_position(street, number, city)?;
        if self.addresses[index].is_primary() {
            return Ok(());
        }

        self.addresses = promoted(&self.addresses, index);
        self.touch();
        Ok(())
    }

    /// Appends a document.
    ///
    /// # Errors
    /// - `Duplicate` when the same `(number, type)` pair exists.
    pub fn add_document(&mut self, document: Document) -> DomainResult<()> {
        if self.documents.contains(&document) {
            return Err(DomainError::duplicate(format!(
                "document `{}` of type `{}` already exists for this customer",
                document.number(),
                document.kind().as_str()
            )));
        }

        let mut documents = self.documents.clone();
        documents.push(document);
        self.documents = documents;
        self.touch();
        Ok(())
    }

    /// Removes the first document with the given number.
    ///
    /// The lookup number is normalized to digits first. Removing the last
    /// document is allowed.
    pub fn remove_document(&mut self, number: &str) -> DomainResult<()> {
        let normalized = normalize_document_number(number);
        let index = self
            .documents
            .iter()
            .position(|document| document.number() == normalized)
            .ok_or_else(|| DomainError::not_found(format!("document `{number}` not found")))?;

        let mut documents = self.documents.clone();
        documents.remove(index);
        self.documents = documents;
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.is_active {
            return Err(DomainError::invariant("customer is already active"));
        }
        self.is_active = true;
        self.touch();
        Ok(())
    }

    pub fn deactivate(&mut self) -> DomainResult<()> {
        if !self.is_active {
            return Err(DomainError::invariant("customer is already inactive"));
        }
        self.is_active = false;
        self.touch();
        Ok(())
    }

    /// Checks the completeness rules required before persistence.
    ///
    /// Pure: never mutates. Rules are checked in a fixed order so the first
    /// failure is deterministic.
    pub fn validate_for_persistence(&self) -> DomainResult<()> {
        if self.emails.is_empty() {
            return Err(DomainError::invariant(
                "customer must have at least one email",
            ));
        }
        if self.primary_email().is_none() {
            return Err(DomainError::invariant("customer must have a primary email"));
        }
        if self.phones.is_empty() {
            return Err(DomainError::invariant(
                "customer must have at least one phone",
            ));
        }
        if self.primary_phone().is_none() {
            return Err(DomainError::invariant("customer must have a primary phone"));
        }
        if self.addresses.is_empty() {
            return Err(DomainError::invariant(
                "customer must have at least one address",
            ));
        }
        if self.primary_address().is_none() {
            return Err(DomainError::invariant(
                "customer must have a primary address",
            ));
        }
        if self.documents.is_empty() {
            return Err(DomainError::invariant(
                "customer must have at least one document",
            ));
        }
        Ok(())
    }

    fn phone_position(&self, area_code: &str, number: &str) -> DomainResult<usize> {
        self.phones
            .iter()
            .position(|phone| phone.matches(area_code, number))
            .ok_or_else(|| {
                DomainError::not_found(format!("phone `({area_code}) {number}` not found"))
            })
    }

    fn address_position(&self, street: &str, number: &str, city: &str) -> DomainResult<usize> {
        self.addresses
            .iter()
            .position(|address| address.matches(street, number, city))
            .ok_or_else(|| {
                DomainError::not_found(format!("address `{street}, {number} - {city}` not found"))
            })
    }

    fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_CHARS {
        return Err(DomainError::validation(
            "customer name must have at least 3 characters",
        ));
    }
    Ok(trimmed.to_string())
}

/// New sequence with `item` appended; a primary newcomer demotes the rest.
fn appended<T: PrimaryFlag>(items: &[T], item: T) -> Vec<T> {
    let mut next: Vec<T> = if item.is_primary() {
        items.iter().map(demoted).collect()
    } else {
        items.to_vec()
    };
    next.push(item);
    next
}

/// New sequence without `index`; a removed primary passes to the new head.
fn removed<T: PrimaryFlag>(items: &[T], index: usize) -> Vec<T> {
    let was_primary = items[index].is_primary();
    let mut next: Vec<T> = items
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != index)
        .map(|(_, item)| item.clone())
        .collect();
    if was_primary {
        if let Some(head) = next.first_mut() {
            *head = head.with_primary(true);
        }
    }
    next
}

/// New sequence where only `index` is primary.
fn promoted<T: PrimaryFlag>(items: &[T], index: usize) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            if position == index {
                item.with_primary(true)
            } else {
                demoted(item)
            }
        })
        .collect()
}

fn demoted<T: PrimaryFlag>(item: &T) -> T {
    if item.is_primary() {
        item.with_primary(false)
    } else {
        item.clone()
    }
}

fn has_duplicates<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(index, item)| items[index + 1..].contains(item))
}

fn ensure_restorable<T: PrimaryFlag + PartialEq>(
    items: &[T],
    collection: &'static str,
) -> DomainResult<()> {
    if has_duplicates(items) {
        return Err(DomainError::invariant(format!(
            "customer has duplicate {collection}"
        )));
    }
    if items.iter().filter(|item| item.is_primary()).count() > 1 {
        return Err(DomainError::invariant(format!(
            "customer has more than one primary entry in {collection}"
        )));
    }
    Ok(())
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{appended, promoted, removed, PrimaryFlag};
    use crate::model::email::Email;

    fn emails(values: &[(&str, bool)]) -> Vec<Email> {
        values
            .iter()
            .map(|(value, primary)| Email::create(*value, *primary).unwrap())
            .collect()
    }

    fn primaries(items: &[Email]) -> Vec<&str> {
        items
            .iter()
            .filter(|item| PrimaryFlag::is_primary(*item))
            .map(Email::value)
            .collect()
    }

    #[test]
    fn appended_primary_demotes_existing_primary() {
        let items = emails(&[("a@x.com", true), ("b@x.com", false)]);
        let next = appended(&items, Email::create("c@x.com", true).unwrap());
        assert_eq!(primaries(&next), vec!["c@x.com"]);
        assert_eq!(primaries(&items), vec!["a@x.com"]);
    }

    #[test]
    fn removed_primary_passes_flag_to_new_head() {
        let items = emails(&[("a@x.com", false), ("b@x.com", true), ("c@x.com", false)]);
        let next = removed(&items, 1);
        assert_eq!(primaries(&next), vec!["a@x.com"]);
    }

    #[test]
    fn removed_secondary_keeps_primary_untouched() {
        let items = emails(&[("a@x.com", false), ("b@x.com", true)]);
        let next = removed(&items, 0);
        assert_eq!(primaries(&next), vec!["b@x.com"]);
    }

    #[test]
    fn promoted_leaves_exactly_one_primary() {
        let items = emails(&[("a@x.com", true), ("b@x.com", false), ("c@x.com", false)]);
        let next = promoted(&items, 2);
        assert_eq!(primaries(&next), vec!["c@x.com"]);
        assert_eq!(next.len(), 3);
    }
}
