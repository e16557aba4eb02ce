//! Phone contact channel value object.

use crate::model::error::{DomainError, DomainResult};
use serde::Serialize;
use std::fmt::{Display, Formatter};

const AREA_CODE_DIGITS: usize = 2;
const MIN_NUMBER_DIGITS: usize = 8;
const MAX_NUMBER_DIGITS: usize = 9;

/// Phone number split into area code and subscriber number.
///
/// Equality is `(area_code, number)`; the primary flag is ignored.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Phone {
    area_code: String,
    number: String,
    is_primary: bool,
}

impl Phone {
    /// Validates both parts and builds a phone.
    ///
    /// # Errors
    /// - `Validation` when a part is blank, reported before its digit check.
    /// - `Validation` when the area code is not exactly 2 digits.
    /// - `Validation` when the number is not 8 or 9 digits.
    pub fn create(
        area_code: impl Into<String>,
        number: impl Into<String>,
        is_primary: bool,
    ) -> DomainResult<Self> {
        let area_code = area_code.into();
        let number = number.into();

        if area_code.trim().is_empty() {
            return Err(DomainError::validation("area code cannot be empty"));
        }
        if area_code.len() != AREA_CODE_DIGITS || !all_ascii_digits(&area_code) {
            return Err(DomainError::validation(format!(
                "area code `{area_code}` must have exactly 2 digits"
            )));
        }

        if number.trim().is_empty() {
            return Err(DomainError::validation("phone number cannot be empty"));
        }
        if !(MIN_NUMBER_DIGITS..=MAX_NUMBER_DIGITS).contains(&number.len())
            || !all_ascii_digits(&number)
        {
            return Err(DomainError::validation(format!(
                "phone number `{number}` must have 8 or 9 digits"
            )));
        }

        Ok(Self {
            area_code,
            number,
            is_primary,
        })
    }

    pub fn area_code(&self) -> &str {
        &self.area_code
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Returns a copy with only the primary flag changed.
    pub fn with_primary(&self, is_primary: bool) -> Self {
        Self {
            area_code: self.area_code.clone(),
            number: self.number.clone(),
            is_primary,
        }
    }

    pub fn matches(&self, area_code: &str, number: &str) -> bool {
        self.area_code == area_code && self.number == number
    }
}

impl PartialEq for Phone {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.area_code, &other.number)
    }
}

impl Display for Phone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.area_code, self.number)
    }
}

fn all_ascii_digits(value: &str) -> bool {
    value.bytes().all(|byte| byte.is_ascii_digit())
}
