//! Core batch types, configuration, and errors.
//!
//! This module provides the result model shared by every stage of the
//! pipeline: the immutable input row, the tri-state validation result,
//! and the engine configuration.

mod config;
mod error;
mod summary;
mod types;

pub use config::*;
pub use error::*;
pub use summary::*;
pub use types::*;
