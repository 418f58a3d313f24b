//! VIES error code classification.

/// Codes meaning VIES (or a member state behind it) is busy or blocking us.
/// The number itself may be perfectly valid; these are retried.
pub const TRANSIENT_CODES: &[&str] = &[
    "SERVICE_UNAVAILABLE",
    "MS_UNAVAILABLE",
    "TIMEOUT",
    "GLOBAL_MAX_CONCURRENT_REQ",
    "GLOBAL_MAX_CONCURRENT_REQ_TIME",
    "MS_MAX_CONCURRENT_REQ",
    "MS_MAX_CONCURRENT_REQ_TIME",
    "VAT_BLOCKED",
    "IP_BLOCKED",
];

/// HTTP statuses worth retrying.
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// What a VIES `userError` / `errorWrappers` code means for the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeClass {
    /// No error (`VALID` or empty).
    Ok,
    /// Temporary unavailability; retry.
    Transient,
    /// VIES rejected the input as malformed.
    Malformed,
    /// VIES rejected the requester's own VAT number; use the anonymous endpoint.
    RequesterRejected,
    /// Definitive non-match.
    Invalid,
}

/// Classify a VIES error code. Unknown codes count as a definitive `Invalid`.
pub fn classify_code(code: &str) -> CodeClass {
    let code = code.trim();
    if code.is_empty() || code.eq_ignore_ascii_case("VALID") {
        return CodeClass::Ok;
    }
    let upper = code.to_ascii_uppercase();
    if TRANSIENT_CODES.contains(&upper.as_str()) {
        return CodeClass::Transient;
    }
    match upper.as_str() {
        "INVALID_INPUT" => CodeClass::Malformed,
        "INVALID_REQUESTER_INFO" => CodeClass::RequesterRejected,
        _ => CodeClass::Invalid,
    }
}

/// True when a free-text error message mentions a transient code.
pub(crate) fn mentions_transient(message: &str) -> bool {
    let upper = message.to_ascii_uppercase();
    TRANSIENT_CODES.iter().any(|code| upper.contains(code))
}

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}
