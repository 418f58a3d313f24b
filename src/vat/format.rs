//! Per-country VAT number format table.

use crate::core::{FormatErrorKind, VatFormatError};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Structural format of one country's VAT numbers.
#[derive(Debug)]
pub struct CountryFormat {
    /// VIES country code.
    pub code: &'static str,
    /// Anchored pattern for the local number (without country prefix).
    pub pattern: &'static str,
    /// Canonical example, country prefix included.
    pub display: &'static str,
    /// Human description of the structure.
    pub description: &'static str,
}

const FORMATS: &[CountryFormat] = &[
    CountryFormat { code: "AT", pattern: r"^U\d{8}$", display: "ATU12345678", description: "'U' followed by 8 digits" },
    CountryFormat { code: "BE", pattern: r"^[01]\d{9}$", display: "BE0123456789", description: "10 digits starting with 0 or 1" },
    CountryFormat { code: "BG", pattern: r"^\d{9,10}$", display: "BG123456789", description: "9 or 10 digits" },
    CountryFormat { code: "CY", pattern: r"^\d{8}[A-Z]$", display: "CY12345678A", description: "8 digits and a letter" },
    CountryFormat { code: "CZ", pattern: r"^\d{8,10}$", display: "CZ12345678", description: "8 to 10 digits" },
    CountryFormat { code: "DE", pattern: r"^[1-9]\d{8}$", display: "DE123456789", description: "9 digits, no leading zero" },
    CountryFormat { code: "DK", pattern: r"^\d{8}$", display: "DK12345678", description: "8 digits" },
    CountryFormat { code: "EE", pattern: r"^\d{9}$", display: "EE123456789", description: "9 digits" },
    CountryFormat { code: "EL", pattern: r"^\d{9}$", display: "EL123456789", description: "9 digits" },
    CountryFormat { code: "ES", pattern: r"^[A-Z0-9]\d{7}[A-Z0-9]$", display: "ESX1234567X", description: "9 characters, first and last may be letters" },
    CountryFormat { code: "FI", pattern: r"^\d{8}$", display: "FI12345678", description: "8 digits" },
    CountryFormat { code: "FR", pattern: r"^[A-Z0-9]{2}\d{9}$", display: "FR12345678901", description: "2 characters key and 9 digits" },
    CountryFormat { code: "HR", pattern: r"^\d{11}$", display: "HR12345678901", description: "11 digits" },
    CountryFormat { code: "HU", pattern: r"^\d{8}$", display: "HU12345678", description: "8 digits" },
    CountryFormat { code: "IE", pattern: r"^\d[A-Z0-9+*]\d{5}[A-Z]{1,2}$", display: "IE1234567A", description: "8 or 9 characters ending in letters" },
    CountryFormat { code: "IT", pattern: r"^\d{11}$", display: "IT12345678901", description: "11 digits" },
    CountryFormat { code: "LT", pattern: r"^(\d{9}|\d{12})$", display: "LT123456789", description: "9 or 12 digits" },
    CountryFormat { code: "LU", pattern: r"^\d{8}$", display: "LU12345678", description: "8 digits" },
    CountryFormat { code: "LV", pattern: r"^\d{11}$", display: "LV12345678901", description: "11 digits" },
    CountryFormat { code: "MT", pattern: r"^\d{8}$", display: "MT12345678", description: "8 digits" },
    CountryFormat { code: "NL", pattern: r"^\d{9}B\d{2}$", display: "NL123456789B01", description: "9 digits, 'B', 2 digits" },
    CountryFormat { code: "PL", pattern: r"^\d{10}$", display: "PL1234567890", description: "10 digits" },
    CountryFormat { code: "PT", pattern: r"^\d{9}$", display: "PT123456789", description: "9 digits" },
    CountryFormat { code: "RO", pattern: r"^[1-9]\d{1,9}$", display: "RO12345678", description: "2 to 10 digits, no leading zero" },
    CountryFormat { code: "SE", pattern: r"^\d{10}01$", display: "SE123456789001", description: "12 digits ending in 01" },
    CountryFormat { code: "SI", pattern: r"^\d{8}$", display: "SI12345678", description: "8 digits" },
    CountryFormat { code: "SK", pattern: r"^\d{10}$", display: "SK1234567890", description: "10 digits" },
    // Northern Ireland, checked by VIES since 2021.
    CountryFormat { code: "XI", pattern: r"^(\d{9}|\d{12}|GD\d{3}|HA\d{3})$", display: "XI123456789", description: "9 or 12 digits, or GD/HA and 3 digits" },
];

static COMPILED: LazyLock<HashMap<&'static str, (Regex, &'static CountryFormat)>> =
    LazyLock::new(|| {
        FORMATS
            .iter()
            .filter_map(|f| Regex::new(f.pattern).ok().map(|re| (f.code, (re, f))))
            .collect()
    });

/// Look up a country's format entry.
pub fn country_format(code: &str) -> Option<&'static CountryFormat> {
    COMPILED.get(code).map(|(_, f)| *f)
}

/// All supported country codes, in table order.
pub fn supported_countries() -> impl Iterator<Item = &'static CountryFormat> {
    FORMATS.iter()
}

/// Check a parsed local number against its country's pattern (no network call).
///
/// `country` must be uppercase, as produced by
/// [`clean_vat_number`](super::clean_vat_number).
pub fn validate_vat_format(
    country: &str,
    number: &str,
) -> Result<&'static CountryFormat, VatFormatError> {
    let value = format!("{country}{number}");
    let Some((re, format)) = COMPILED.get(country) else {
        return Err(VatFormatError::new(
            value,
            FormatErrorKind::UnknownCountry,
            format!("unknown country code '{country}'"),
        ));
    };

    if re.is_match(number) {
        Ok(format)
    } else {
        Err(VatFormatError::new(
            value,
            FormatErrorKind::Pattern,
            format!(
                "invalid format for {}: expected {} (e.g. {})",
                format.code, format.description, format.display
            ),
        ))
    }
}
