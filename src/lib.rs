//! # eu-vat-bulk
//!
//! Bulk validation of EU VAT identification numbers against the European
//! Commission's VIES service.
//!
//! The crate takes raw spreadsheet cells, normalises them into VAT strings,
//! rejects structurally broken numbers locally, and verifies the rest
//! through a bounded pool of workers. Each remote check retries transient
//! VIES failures, and a per-country circuit breaker cuts the retry budget
//! for member states that keep failing. Partial progress is checkpointed
//! so an interrupted batch resumes where it stopped. When the caller knows
//! the expected company name, the name VIES reports is scored against it
//! to flag possible identity fraud.
//!
//! ## Quick Start
//!
//! ```rust
//! use eu_vat_bulk::vat::{clean_vat_number, normalize_cell, validate_vat_format, CellValue};
//!
//! let raw = normalize_cell(&CellValue::Text("DK 47 45 87 14".into())).unwrap();
//! let parsed = clean_vat_number(&raw).unwrap();
//! assert_eq!(parsed.country, "DK");
//! assert_eq!(parsed.number, "47458714");
//! assert!(validate_vat_format(&parsed.country, &parsed.number).is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Data model, normalisation, parsing, format table, fraud scoring |
//! | `vies` | VIES HTTP client, retrying verifier, circuit breaker |
//! | `engine` (default) | Concurrent dispatcher, result store, checkpoints |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod vat;

#[cfg(feature = "core")]
pub mod fraud;

#[cfg(feature = "vies")]
pub mod vies;

#[cfg(feature = "engine")]
pub mod engine;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
