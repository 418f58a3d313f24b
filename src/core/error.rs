use thiserror::Error;

/// Errors that can abort a batch or its setup.
///
/// Failures tied to a single row never surface here; they are recorded
/// as a [`ValidationResult`](super::ValidationResult) and the batch moves on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or missing engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A checkpoint could not be read, written, or decoded.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Filesystem error from checkpoint storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint (de)serialisation error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Result alias for batch-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a VAT string was rejected before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatErrorKind {
    /// Nothing left after stripping separators.
    Empty,
    /// Fewer than two leading letters.
    MissingCountryCode,
    /// Country code present but no local number follows it.
    MissingNumber,
    /// Country code not in the format table.
    UnknownCountry,
    /// Local number does not match the country's pattern.
    Pattern,
}

/// Error returned when a VAT string fails parsing or format validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VatFormatError {
    /// The rejected input value.
    pub value: String,
    /// Category of the failure.
    pub kind: FormatErrorKind,
    /// Human-readable reason, shown to the user as the error detail.
    pub reason: String,
}

impl VatFormatError {
    pub(crate) fn new(value: impl Into<String>, kind: FormatErrorKind, reason: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for VatFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid VAT number '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for VatFormatError {}
