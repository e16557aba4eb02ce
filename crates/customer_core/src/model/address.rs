//! Postal address value object.
//!
//! # Invariants
//! - `street`, `number`, `city`, `state`, `zip_code` and `country` are non-blank.
//! - Equality ignores `complement` and `is_primary`.
//! - Lookup keys (`street`, `number`, `city`) compare case-insensitively.

use crate::model::email::fold_case;
use crate::model::error::{DomainError, DomainResult};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Raw field values used to build an [`Address`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Eq, Serialize)]
pub struct Address {
    street: String,
    number: String,
    complement: Option<String>,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    is_primary: bool,
}

impl Address {
    /// Validates required fields and builds an address.
    ///
    /// A blank complement is stored as `None`.
    ///
    /// # Errors
    /// - `Validation` naming the first blank required field.
    pub fn create(fields: AddressFields, is_primary: bool) -> DomainResult<Self> {
        require(&fields.street, "street cannot be empty")?;
        require(&fields.number, "address number cannot be empty")?;
        require(&fields.city, "city cannot be empty")?;
        require(&fields.state, "state cannot be empty")?;
        require(&fields.zip_code, "zip code cannot be empty")?;
        require(&fields.country, "country cannot be empty")?;

        Ok(Self {
            street: fields.street,
            number: fields.number,
            complement: fields.complement.filter(|value| !value.trim().is_empty()),
            city: fields.city,
            state: fields.state,
            zip_code: fields.zip_code,
            country: fields.country,
            is_primary,
        })
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn complement(&self) -> Option<&str> {
        self.complement.as_deref()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Returns a copy with only the primary flag changed.
    pub fn with_primary(&self, is_primary: bool) -> Self {
        Self {
            is_primary,
            ..self.clone()
        }
    }

    /// Case-insensitive match on the `(street, number, city)` lookup key.
    pub fn matches(&self, street: &str, number: &str, city: &str) -> bool {
        fold_case(&self.street).eq(fold_case(street))
            && fold_case(&self.number).eq(fold_case(number))
            && fold_case(&self.city).eq(fold_case(city))
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.street == other.street
            && self.number == other.number
            && self.city == other.city
            && self.state == other.state
            && self.zip_code == other.zip_code
            && self.country == other.country
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} - {}/{}",
            self.street, self.number, self.city, self.state
        )
    }
}

fn require(value: &str, message: &'static str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(message));
    }
    Ok(())
}
