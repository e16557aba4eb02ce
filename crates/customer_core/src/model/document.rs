//! Identification document value object.
//!
//! # Invariants
//! - `number` holds ASCII digits only (punctuation stripped at creation).
//! - CPF numbers have 11 digits and CNPJ numbers 14; other types, including a
//!   blank type code, are unchecked. There is no checksum validation.

use crate::model::error::{DomainError, DomainResult};
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

const CPF_DIGITS: usize = 11;
const CNPJ_DIGITS: usize = 14;

/// Document type. Codes are matched case-sensitively (`"CPF"`, `"CNPJ"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentType {
    /// Brazilian individual taxpayer id.
    Cpf,
    /// Brazilian company taxpayer id.
    Cnpj,
    /// Any other document type, stored verbatim.
    Other(String),
}

impl DocumentType {
    pub fn parse(code: &str) -> Self {
        match code {
            "CPF" => Self::Cpf,
            "CNPJ" => Self::Cnpj,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
            Self::Other(code) => code,
        }
    }
}

impl Serialize for DocumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    number: String,
    #[serde(rename = "type")]
    kind: DocumentType,
}

impl Document {
    /// Normalizes `number` to digits and validates it against `kind`.
    ///
    /// Types other than CPF and CNPJ are stored without further checks, even
    /// when no digits remain after normalization.
    ///
    /// # Errors
    /// - `Validation` when the number is blank.
    /// - `Validation` when a CPF/CNPJ has the wrong digit count.
    pub fn create(number: &str, kind: &str) -> DomainResult<Self> {
        if number.trim().is_empty() {
            return Err(DomainError::validation("document number cannot be empty"));
        }

        Self::checked(normalize_document_number(number), kind, number)
    }

    /// Rebuilds a document from its stored, already-normalized number.
    ///
    /// # Errors
    /// - `Validation` when `number` holds anything but ASCII digits.
    /// - `Validation` when a CPF/CNPJ has the wrong digit count.
    pub fn restore(number: String, kind: &str) -> DomainResult<Self> {
        if !number.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "stored document number `{number}` is not normalized"
            )));
        }
        let raw = number.clone();
        Self::checked(number, kind, &raw)
    }

    fn checked(normalized: String, kind: &str, raw: &str) -> DomainResult<Self> {
        let kind = DocumentType::parse(kind);
        match kind {
            DocumentType::Cpf if normalized.len() != CPF_DIGITS => {
                Err(DomainError::validation(format!("invalid CPF `{raw}`")))
            }
            DocumentType::Cnpj if normalized.len() != CNPJ_DIGITS => {
                Err(DomainError::validation(format!("invalid CNPJ `{raw}`")))
            }
            _ => Ok(Self {
                number: normalized,
                kind,
            }),
        }
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn kind(&self) -> &DocumentType {
        &self.kind
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.number)
    }
}

/// Strips every non-digit character from a document number.
///
/// Repository lookups apply the same normalization to the numbers they search for.
pub fn normalize_document_number(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_document_number, Document, DocumentType};

    #[test]
    fn cpf_punctuation_is_stripped() {
        let doc = Document::create("123.456.789-01", "CPF").unwrap();
        assert_eq!(doc.number(), "12345678901");
        assert_eq!(doc.kind(), &DocumentType::Cpf);
    }

    #[test]
    fn lowercase_code_is_an_unchecked_type() {
        let doc = Document::create("123", "cpf").unwrap();
        assert_eq!(doc.kind(), &DocumentType::Other("cpf".to_string()));
    }

    #[test]
    fn unchecked_types_accept_numbers_without_digits() {
        let doc = Document::create("AB-CD", "RG").unwrap();
        assert_eq!(doc.number(), "");
        assert_eq!(doc.kind(), &DocumentType::Other("RG".to_string()));

        let untyped = Document::create("123", "").unwrap();
        assert_eq!(untyped.kind().as_str(), "");
    }

    #[test]
    fn restore_accepts_stored_digits_only() {
        assert_eq!(Document::restore(String::new(), "RG").unwrap().number(), "");
        assert!(Document::restore("123.4".to_string(), "RG").is_err());
        assert!(Document::restore("123".to_string(), "CPF").is_err());
    }

    #[test]
    fn normalize_keeps_only_ascii_digits() {
        assert_eq!(normalize_document_number(" 12.a3/4-5 "), "12345");
    }
}
