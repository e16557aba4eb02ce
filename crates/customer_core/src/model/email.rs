//! Email contact channel value object.
//!
//! # Invariants
//! - `value` always matches `local@domain.tld` shape.
//! - Equality ignores letter case, non-ASCII letters included, and the
//!   primary flag.

use crate::model::error::{DomainError, DomainResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, Eq, Serialize)]
pub struct Email {
    value: String,
    is_primary: bool,
}

impl Email {
    /// Validates `value` and builds an email.
    ///
    /// # Errors
    /// - `Validation` when the value is blank or not shaped like an address.
    pub fn create(value: impl Into<String>, is_primary: bool) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::validation("email address cannot be empty"));
        }
        if !EMAIL_RE.is_match(&value) {
            return Err(DomainError::validation(format!(
                "invalid email format: `{value}`"
            )));
        }

        Ok(Self { value, is_primary })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Returns a copy with only the primary flag changed.
    pub fn with_primary(&self, is_primary: bool) -> Self {
        Self {
            value: self.value.clone(),
            is_primary,
        }
    }

    /// Case-insensitive match against a raw lookup value, using Unicode
    /// lowercase mappings.
    pub fn matches(&self, value: &str) -> bool {
        fold_case(&self.value).eq(fold_case(value))
    }
}

pub(crate) fn fold_case(value: &str) -> impl Iterator<Item = char> + '_ {
    value.chars().flat_map(char::to_lowercase)
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::Email;
    use crate::model::error::DomainErrorKind;

    #[test]
    fn rejects_values_without_dot_after_at() {
        let err = Email::create("user@localhost", false).unwrap_err();
        assert_eq!(err.kind(), DomainErrorKind::Validation);
    }

    #[test]
    fn rejects_embedded_whitespace_and_double_at() {
        assert!(Email::create("us er@x.com", false).is_err());
        assert!(Email::create("a@b@x.com", false).is_err());
    }

    #[test]
    fn equality_ignores_case_and_primary_flag() {
        let lower = Email::create("joao@x.com", true).unwrap();
        let upper = Email::create("JOAO@X.COM", false).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn equality_folds_non_ascii_letters() {
        let upper = Email::create("ÁNA@x.com", true).unwrap();
        assert!(upper.matches("ána@X.COM"));
        assert!(!upper.matches("ana@x.com"));
    }
}
