//! Split a VAT string into country code and local number.

use crate::core::{FormatErrorKind, VatFormatError};
use serde::{Deserialize, Serialize};

/// A VAT number split into its two-letter country code and local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedVat {
    /// Uppercase country code, as used by VIES (e.g. "EL" for Greece).
    pub country: String,
    /// Local number, uppercase, separators removed.
    pub number: String,
}

impl ParsedVat {
    /// Country code and number joined, e.g. "DK47458714".
    pub fn full(&self) -> String {
        format!("{}{}", self.country, self.number)
    }
}

/// Strip separators and split off the country prefix.
///
/// Every character that is not an ASCII letter or digit is dropped and the
/// rest is uppercased. The first two characters must be letters; at least
/// one character must follow them. Check digits are not inspected.
pub fn clean_vat_number(input: &str) -> Result<ParsedVat, VatFormatError> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.is_empty() {
        return Err(VatFormatError::new(
            input,
            FormatErrorKind::Empty,
            "no letters or digits",
        ));
    }

    let prefix = cleaned.as_bytes();
    if prefix.len() < 2 || !prefix[0].is_ascii_alphabetic() || !prefix[1].is_ascii_alphabetic() {
        return Err(VatFormatError::new(
            input,
            FormatErrorKind::MissingCountryCode,
            "missing or invalid country code",
        ));
    }

    let (country, number) = cleaned.split_at(2);
    if number.is_empty() {
        return Err(VatFormatError::new(
            input,
            FormatErrorKind::MissingNumber,
            format!("no number after country code '{country}'"),
        ));
    }

    Ok(ParsedVat {
        country: country.to_string(),
        number: number.to_string(),
    })
}
