//! VIES REST request and response bodies.

use super::classify::{CodeClass, classify_code, mentions_transient};
use super::client::LookupOutcome;
use crate::core::CompanyRecord;
use serde::{Deserialize, Serialize};

/// Response of `GET /rest-api/ms/{country}/vat/{number}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousResponse {
    pub is_valid: Option<bool>,
    pub user_error: Option<String>,
    pub request_date: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub vat_number: Option<String>,
    /// Free-text error some gateways return instead of `userError`.
    pub error: Option<String>,
}

/// Body of `POST /rest-api/check-vat-number`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckVatRequest {
    pub country_code: String,
    pub vat_number: String,
    pub requester_country_code: String,
    pub requester_vat_number: String,
}

/// Response of `POST /rest-api/check-vat-number`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckVatResponse {
    pub valid: Option<bool>,
    pub user_error: Option<String>,
    pub request_date: Option<String>,
    pub request_identifier: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub error_wrappers: Option<Vec<ErrorWrapper>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorWrapper {
    pub error: Option<String>,
    pub message: Option<String>,
}

/// VIES uses "---" for undisclosed fields.
fn disclosed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "---")
}

impl AnonymousResponse {
    pub(crate) fn into_outcome(self) -> LookupOutcome {
        if let Some(message) = self.error.as_deref() {
            if mentions_transient(message) {
                return LookupOutcome::Transient(message.to_string());
            }
        }
        let record = CompanyRecord {
            name: disclosed(self.name),
            address: disclosed(self.address),
            request_date: disclosed(self.request_date),
            consultation_id: None,
        };
        decide(self.is_valid, self.user_error, record)
    }
}

impl CheckVatResponse {
    pub(crate) fn into_outcome(self) -> LookupOutcome {
        let code = self.user_error.or_else(|| {
            self.error_wrappers
                .unwrap_or_default()
                .into_iter()
                .find_map(|w| w.error.or(w.message))
        });
        let record = CompanyRecord {
            name: disclosed(self.name),
            address: disclosed(self.address),
            request_date: disclosed(self.request_date),
            consultation_id: disclosed(self.request_identifier),
        };
        decide(self.valid, code, record)
    }

    /// True when the body carries an error code at all.
    pub(crate) fn has_error(&self) -> bool {
        self.user_error.as_deref().is_some_and(|c| classify_code(c) != CodeClass::Ok)
            || self.error_wrappers.as_ref().is_some_and(|w| !w.is_empty())
    }
}

fn decide(valid: Option<bool>, code: Option<String>, record: CompanyRecord) -> LookupOutcome {
    let code = code.unwrap_or_default();
    match classify_code(&code) {
        CodeClass::Transient => return LookupOutcome::Transient(code),
        CodeClass::Malformed => return LookupOutcome::Malformed(code),
        CodeClass::RequesterRejected => return LookupOutcome::RequesterRejected(code),
        CodeClass::Invalid => {
            return LookupOutcome::Invalid { record, code };
        }
        CodeClass::Ok => {}
    }

    match valid {
        Some(true) => LookupOutcome::Valid(record),
        Some(false) => LookupOutcome::Invalid {
            record,
            code: "VAT number not found".into(),
        },
        // No verdict and no error code: not an answer, so retry.
        None => LookupOutcome::Transient("NO_VALIDITY_IN_RESPONSE".into()),
    }
}
