//! EU VIES REST API client.

use super::classify::is_retryable_status;
use super::wire::{AnonymousResponse, CheckVatRequest, CheckVatResponse};
use crate::core::{CompanyRecord, EngineConfig, Error, Requester};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::fmt;

/// Classified answer to a single remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The number is registered.
    Valid(CompanyRecord),
    /// The number is definitively not registered.
    Invalid { record: CompanyRecord, code: String },
    /// VIES rejected the input as malformed.
    Malformed(String),
    /// VIES is temporarily unable to answer.
    Transient(String),
    /// The requester's own VAT number was refused.
    RequesterRejected(String),
}

/// Transport-level failure of a single VIES call. Always retried.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ViesError {
    /// Connection or I/O error.
    Network(String),
    /// The request exceeded its timeout.
    Timeout,
    /// Unexpected HTTP status without a usable body.
    Http { status: u16, body: String },
    /// Failed to parse the response.
    Parse(String),
}

impl fmt::Display for ViesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "VIES network error: {e}"),
            Self::Timeout => write!(f, "VIES request timed out"),
            Self::Http { status, .. } => write!(f, "VIES returned HTTP {status}"),
            Self::Parse(e) => write!(f, "VIES parse error: {e}"),
        }
    }
}

impl std::error::Error for ViesError {}

impl From<reqwest::Error> for ViesError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// One remote VIES call per method. Retrying is the caller's business.
#[async_trait]
pub trait VatLookup: Send + Sync {
    /// `GET /rest-api/ms/{country}/vat/{number}`.
    async fn check_anonymous(&self, country: &str, number: &str)
    -> Result<LookupOutcome, ViesError>;

    /// `POST /rest-api/check-vat-number` on behalf of `requester`.
    async fn check_authenticated(
        &self,
        country: &str,
        number: &str,
        requester: &Requester,
    ) -> Result<LookupOutcome, ViesError>;
}

/// reqwest-backed VIES client. Cheap to share: one connection pool.
#[derive(Debug, Clone)]
pub struct ViesClient {
    http: reqwest::Client,
    base_url: String,
}

impl ViesClient {
    /// Build a client with the configured timeout and browser-style headers.
    ///
    /// # Errors
    ///
    /// Returns `Error::HttpClient` if the TLS backend or headers are rejected.
    pub fn new(config: &EngineConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read status and body; hand back the body only if the status allows
    /// it to carry a verdict.
    async fn read_body(resp: reqwest::Response) -> Result<(u16, String), ViesError> {
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if is_retryable_status(status) {
            return Err(ViesError::Http { status, body });
        }
        Ok((status, body))
    }
}

#[async_trait]
impl VatLookup for ViesClient {
    async fn check_anonymous(
        &self,
        country: &str,
        number: &str,
    ) -> Result<LookupOutcome, ViesError> {
        let url = format!("{}/rest-api/ms/{country}/vat/{number}", self.base_url);
        tracing::debug!(%country, %number, "VIES anonymous lookup");

        let resp = self.http.get(&url).send().await?;
        let (status, body) = Self::read_body(resp).await?;

        match serde_json::from_str::<AnonymousResponse>(&body) {
            Ok(parsed) if (200..300).contains(&status) => Ok(parsed.into_outcome()),
            Ok(parsed) if parsed.user_error.is_some() || parsed.error.is_some() => {
                Ok(parsed.into_outcome())
            }
            Ok(_) => Err(ViesError::Http { status, body }),
            Err(e) if (200..300).contains(&status) => Err(ViesError::Parse(e.to_string())),
            Err(_) => Err(ViesError::Http { status, body }),
        }
    }

    async fn check_authenticated(
        &self,
        country: &str,
        number: &str,
        requester: &Requester,
    ) -> Result<LookupOutcome, ViesError> {
        let url = format!("{}/rest-api/check-vat-number", self.base_url);
        let req = CheckVatRequest {
            country_code: country.to_string(),
            vat_number: number.to_string(),
            requester_country_code: requester.country.clone(),
            requester_vat_number: requester.number.clone(),
        };
        tracing::debug!(%country, %number, requester = %requester.country, "VIES authenticated lookup");

        let resp = self.http.post(&url).json(&req).send().await?;
        let (status, body) = Self::read_body(resp).await?;

        match serde_json::from_str::<CheckVatResponse>(&body) {
            Ok(parsed) if (200..300).contains(&status) || parsed.has_error() => {
                Ok(parsed.into_outcome())
            }
            Ok(_) => Err(ViesError::Http { status, body }),
            Err(e) if (200..300).contains(&status) => Err(ViesError::Parse(e.to_string())),
            Err(_) => Err(ViesError::Http { status, body }),
        }
    }
}
