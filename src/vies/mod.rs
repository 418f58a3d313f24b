//! VIES verification: HTTP client, retry state machine, circuit breaker.
//!
//! One row goes through [`Verifier::verify`], which tries the
//! authenticated endpoint first (when the caller supplied their own VAT
//! number, because only that endpoint issues a consultation identifier),
//! falls back to the anonymous endpoint, and retries transient failures
//! within a budget that the per-country [`CircuitBreaker`] may shrink.
//!
//! # Example
//!
//! ```ignore
//! use eu_vat_bulk::EngineConfig;
//! use eu_vat_bulk::vies::{ViesClient, Verifier};
//!
//! let config = EngineConfig::default();
//! let verifier = Verifier::new(ViesClient::new(&config)?, &config);
//! let result = verifier.verify(&row).await;
//! ```

mod breaker;
mod classify;
mod client;
mod verifier;
mod wire;

pub use breaker::CircuitBreaker;
pub use classify::{CodeClass, TRANSIENT_CODES, classify_code, is_retryable_status};
pub use client::{LookupOutcome, VatLookup, ViesClient, ViesError};
pub use verifier::{DelayStrategy, FixedDelay, NoDelay, Verifier};
pub use wire::{AnonymousResponse, CheckVatRequest, CheckVatResponse, ErrorWrapper};
