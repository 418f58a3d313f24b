use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The caller's own VAT number, used for authenticated VIES lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Two-letter VIES country code (e.g. "DK").
    pub country: String,
    /// Local number without the country prefix.
    pub number: String,
}

/// One row of an uploaded batch, after normalisation and parsing.
///
/// Rows are immutable once built. `country` and `number` are `None` when the
/// VAT string could not be split; such rows still flow through the pipeline
/// and come out as `format_error` results without any remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRow {
    /// Position of the row in the original upload. Stable, never reused.
    pub index: usize,
    /// Raw cell value as text, for error reporting.
    pub raw: String,
    /// Normalised VAT string (output of the input normaliser).
    pub vat: String,
    /// Parsed country code.
    pub country: Option<String>,
    /// Parsed local number.
    pub number: Option<String>,
    /// Own VAT number for the authenticated endpoint.
    pub requester: Option<Requester>,
    /// Company name the user expects VIES to report.
    pub expected_name: Option<String>,
}

/// Error category of a validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// VIES confirmed the number.
    None,
    /// VIES definitively rejected the number.
    Invalid,
    /// VIES was unavailable; validity is unknown.
    ServiceUnavailable,
    /// Rejected locally, no remote call was made.
    FormatError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Invalid => "invalid",
            Self::ServiceUnavailable => "service_unavailable",
            Self::FormatError => "format_error",
        })
    }
}

/// Tri-state validity. `Unknown` is never the same as `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Invalid,
    Unknown,
}

impl Validity {
    /// `Some(bool)` for a definitive answer, `None` for `Unknown`.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Valid => Some(true),
            Self::Invalid => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Outcome of comparing the VIES-reported name with the expected name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudStatus {
    /// Score above 60.
    Verified,
    /// Score between 20 and 60 inclusive.
    CheckManually,
    /// Score below 20.
    PotentialFraud,
}

impl fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Verified => "Verified",
            Self::CheckManually => "Check Manually",
            Self::PotentialFraud => "Potential Fraud",
        })
    }
}

/// Name-match score and its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudAssessment {
    /// Best similarity score, 0–100.
    pub score: u8,
    pub status: FraudStatus,
}

/// Registry data returned by VIES for a definitive answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Registered legal name, if VIES disclosed it.
    pub name: Option<String>,
    /// Registered address, if VIES disclosed it.
    pub address: Option<String>,
    /// Request date reported by VIES.
    pub request_date: Option<String>,
    /// Consultation identifier (authenticated endpoint only).
    pub consultation_id: Option<String>,
}

/// Verdict for one row.
///
/// Only the constructors below build a result, which keeps `valid` and
/// `error_type` consistent: `valid` is `Unknown` exactly when `error_type`
/// is `ServiceUnavailable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Original row index.
    pub index: usize,
    /// VAT string as checked.
    pub vat: String,
    /// Parsed country code, if parsing succeeded.
    pub country: Option<String>,
    pub error_type: ErrorType,
    pub valid: Validity,
    pub name: Option<String>,
    pub address: Option<String>,
    pub request_date: Option<String>,
    /// Legal proof of the check; present only after an authenticated success.
    pub consultation_id: Option<String>,
    /// Specific reason for anything other than a confirmed valid number.
    pub error_detail: Option<String>,
    /// Present only when an expected name was supplied and VIES returned a name.
    pub fraud: Option<FraudAssessment>,
    /// Remote attempts made (0 for format errors).
    pub attempts: u32,
    /// When the result became terminal.
    pub checked_at: DateTime<Utc>,
}

impl ValidationResult {
    fn base(row: &ValidationRow, error_type: ErrorType, valid: Validity, attempts: u32) -> Self {
        Self {
            index: row.index,
            vat: row.vat.clone(),
            country: row.country.clone(),
            error_type,
            valid,
            name: None,
            address: None,
            request_date: None,
            consultation_id: None,
            error_detail: None,
            fraud: None,
            attempts,
            checked_at: Utc::now(),
        }
    }

    fn with_record(mut self, record: CompanyRecord) -> Self {
        self.name = record.name;
        self.address = record.address;
        self.request_date = record.request_date;
        self.consultation_id = record.consultation_id;
        self
    }

    /// VIES confirmed the number.
    pub fn valid(row: &ValidationRow, record: CompanyRecord, attempts: u32) -> Self {
        Self::base(row, ErrorType::None, Validity::Valid, attempts).with_record(record)
    }

    /// VIES definitively rejected the number.
    pub fn invalid(
        row: &ValidationRow,
        record: CompanyRecord,
        detail: impl Into<String>,
        attempts: u32,
    ) -> Self {
        let mut result =
            Self::base(row, ErrorType::Invalid, Validity::Invalid, attempts).with_record(record);
        result.error_detail = Some(detail.into());
        result
    }

    /// The number is malformed or its country unsupported.
    pub fn format_error(row: &ValidationRow, detail: impl Into<String>, attempts: u32) -> Self {
        let mut result = Self::base(row, ErrorType::FormatError, Validity::Invalid, attempts);
        result.error_detail = Some(detail.into());
        result
    }

    /// VIES could not give an answer within the retry budget.
    pub fn service_unavailable(row: &ValidationRow, detail: impl Into<String>, attempts: u32) -> Self {
        let mut result = Self::base(
            row,
            ErrorType::ServiceUnavailable,
            Validity::Unknown,
            attempts,
        );
        result.error_detail = Some(detail.into());
        result
    }

    /// Everything except `service_unavailable` is final.
    pub fn is_definitive(&self) -> bool {
        self.error_type != ErrorType::ServiceUnavailable
    }

    /// Label shown to users. Service outages are kept apart from invalid numbers.
    pub fn display_status(&self) -> &'static str {
        match self.error_type {
            ErrorType::None => "Valid",
            ErrorType::Invalid => "Invalid",
            ErrorType::ServiceUnavailable => "Service Unavailable",
            ErrorType::FormatError => "Format Error",
        }
    }
}
