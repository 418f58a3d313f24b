//! Local VAT number handling: cell normalisation, parsing, and format checks.
//!
//! Everything here is pure and runs before any network call, so
//! structurally broken numbers never cost VIES quota or retry delays.
//!
//! # Example
//!
//! ```
//! use eu_vat_bulk::vat::*;
//!
//! assert_eq!(normalize_cell(&CellValue::Number(123456780.0)).as_deref(), Some("123456780"));
//!
//! let parsed = clean_vat_number("DK-12 34.56").unwrap();
//! assert_eq!((parsed.country.as_str(), parsed.number.as_str()), ("DK", "123456"));
//!
//! assert!(validate_vat_format("DE", "123456789").is_ok());
//! assert!(validate_vat_format("DE", "12345678").is_err());
//! ```

mod batch;
mod format;
mod normalize;
mod parse;

pub use batch::{DuplicateRow, PreparedBatch, RawRow, prepare_rows};
pub use format::{CountryFormat, country_format, supported_countries, validate_vat_format};
pub use normalize::{CellValue, normalize_cell};
pub use parse::{ParsedVat, clean_vat_number};
