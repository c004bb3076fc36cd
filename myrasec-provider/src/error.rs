//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use myrasec_api::ApiError;

use crate::diagnostics::Severity;

/// Provider layer error type
///
/// Every variant becomes exactly one diagnostic. [`EntityNotFound`](Self::EntityNotFound)
/// is the only warning: the caller clears the state and the next plan recreates
/// the object.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ProviderError {
    /// `api_key` or `secret` is empty
    #[error("Missing credentials: {0} must be set")]
    MissingCredentials(String),

    /// A configuration or state value could not be parsed
    #[error("Failed to parse '{field}': {detail}")]
    ParseError { field: String, detail: String },

    /// Import id does not follow the expected grammar
    #[error("Malformed import id '{id}', expected {expected}")]
    MalformedImportId { id: String, expected: String },

    /// Certificate PEM block missing or undecodable
    #[error("Invalid certificate PEM: {0}")]
    InvalidCertPem(String),

    /// Private key PEM block of an unsupported type
    #[error("Unsupported private key format: {0}")]
    UnsupportedKeyFormat(String),

    /// Private key does not belong to the certificate
    #[error("Private key does not match the certificate public key")]
    KeyCertificateMismatch,

    /// Subdomain search did not yield exactly one match
    #[error("Expected exactly one subdomain named '{name}', found {matches}")]
    AmbiguousSubdomain { name: String, matches: usize },

    /// Scope (domain, subdomain, tag) resolution failed
    #[error("Unable to resolve {what}: {detail}")]
    LookupFailed { what: String, detail: String },

    /// Error returned by the Myra API
    #[error("{0}")]
    VendorApi(#[from] ApiError),

    /// Object vanished on the vendor side
    #[error("{kind} '{id}' not found")]
    EntityNotFound { kind: String, id: String },

    /// Deadline reached or operation cancelled by the orchestrator
    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl ProviderError {
    /// Whether it is expected behavior (user input, missing object, ...), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::MissingCredentials(_)
            | Self::ParseError { .. }
            | Self::MalformedImportId { .. }
            | Self::InvalidCertPem(_)
            | Self::UnsupportedKeyFormat(_)
            | Self::KeyCertificateMismatch
            | Self::AmbiguousSubdomain { .. }
            | Self::EntityNotFound { .. }
            | Self::Cancelled(_) => true,
            Self::VendorApi(e) => e.is_expected(),
            Self::LookupFailed { .. } => false,
        }
    }

    /// Severity of the diagnostic this error turns into.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::EntityNotFound { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Short diagnostic summary.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "Missing credentials",
            Self::ParseError { .. } => "Parse error",
            Self::MalformedImportId { .. } => "Malformed import id",
            Self::InvalidCertPem(_) => "Invalid certificate",
            Self::UnsupportedKeyFormat(_) => "Unsupported key format",
            Self::KeyCertificateMismatch => "Key/certificate mismatch",
            Self::AmbiguousSubdomain { .. } => "Ambiguous subdomain",
            Self::LookupFailed { .. } => "Lookup failed",
            Self::VendorApi(_) => "Myra API error",
            Self::EntityNotFound { .. } => "Object not found",
            Self::Cancelled(_) => "Operation cancelled",
        }
    }

    /// Shorthand for [`EntityNotFound`](Self::EntityNotFound).
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::EntityNotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for [`ParseError`](Self::ParseError).
    pub fn parse(field: impl Into<String>, detail: impl ToString) -> Self {
        Self::ParseError {
            field: field.into(),
            detail: detail.to_string(),
        }
    }

    /// Shorthand for [`LookupFailed`](Self::LookupFailed).
    pub fn lookup(what: impl Into<String>, detail: impl ToString) -> Self {
        Self::LookupFailed {
            what: what.into(),
            detail: detail.to_string(),
        }
    }
}

/// Provider layer Result type alias
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
