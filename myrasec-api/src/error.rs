use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single validation message returned by the vendor API.
///
/// Myra reports request validation failures as a `violationList`; each entry
/// names the offending property (when known) and a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Property path of the offending field (e.g. `"ttl"`), if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_path: Option<String>,
    /// Validation message.
    #[serde(default)]
    pub message: String,
}

/// Unified error type for all Myra API operations.
///
/// All variants are serializable for structured error reporting.
///
/// # Retryable Errors
///
/// - [`NetworkError`](Self::NetworkError): network connectivity issues
/// - [`Timeout`](Self::Timeout): request timed out
/// - [`RateLimited`](Self::RateLimited): API rate limit exceeded
///
/// The built-in HTTP client retries these with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ApiError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The API rate limit has been exceeded (HTTP 429).
    RateLimited {
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The API key / secret pair was rejected (HTTP 401/403).
    InvalidCredentials {
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The addressed endpoint or object does not exist (HTTP 404).
    NotFound {
        /// Request path that produced the error.
        path: String,
        /// Original error message from the API, if available.
        raw_message: Option<String>,
    },

    /// The API rejected the request with one or more field violations.
    Violation {
        /// Violations in the order reported by the API.
        violations: Vec<Violation>,
    },

    /// Failed to parse the API response.
    ParseError {
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to serialize a request body.
    SerializationError {
        /// Details about the serialization failure.
        detail: String,
    },

    /// The client does not implement the requested operation.
    Unsupported {
        /// Name of the unsupported operation.
        operation: String,
    },

    /// An unrecognized error from the API.
    Unknown {
        /// HTTP status code, if the error came from a response.
        status: Option<u16>,
        /// Raw error message.
        raw_message: String,
    },
}

impl ApiError {
    /// 是否可重试（网络错误、超时、限流）
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. } | Self::NotFound { .. } | Self::Violation { .. }
        )
    }

    /// Group violation messages by property path.
    ///
    /// Violations without a property path are collected under the empty key.
    /// Returns an empty map for every other variant.
    pub fn violation_map(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        if let Self::Violation { violations } = self {
            for v in violations {
                map.entry(v.property_path.as_deref().unwrap_or_default())
                    .or_default()
                    .push(v.message.as_str());
            }
        }
        map
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { detail } => write!(f, "Network error: {detail}"),
            Self::Timeout { detail } => write!(f, "Request timeout: {detail}"),
            Self::RateLimited { retry_after, .. } => {
                if let Some(secs) = retry_after {
                    write!(f, "Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "Rate limited")
                }
            }
            Self::InvalidCredentials { raw_message } => {
                if let Some(msg) = raw_message {
                    write!(f, "Invalid credentials: {msg}")
                } else {
                    write!(f, "Invalid credentials")
                }
            }
            Self::NotFound { path, raw_message } => {
                if let Some(msg) = raw_message {
                    write!(f, "Not found: {path}: {msg}")
                } else {
                    write!(f, "Not found: {path}")
                }
            }
            Self::Violation { violations } => {
                let messages: Vec<&str> = violations.iter().map(|v| v.message.as_str()).collect();
                write!(f, "Request rejected: {}", messages.join("; "))
            }
            Self::ParseError { detail } => write!(f, "Parse error: {detail}"),
            Self::SerializationError { detail } => write!(f, "Serialization error: {detail}"),
            Self::Unsupported { operation } => write!(f, "Unsupported operation: {operation}"),
            Self::Unknown {
                status: Some(status),
                raw_message,
            } => write!(f, "HTTP {status}: {raw_message}"),
            Self::Unknown {
                status: None,
                raw_message,
            } => write!(f, "{raw_message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;
