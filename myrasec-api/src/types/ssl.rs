use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intermediate certificate of a chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslIntermediate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cert: String,
}

/// Uploaded SSL certificate of a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCertificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alternatives: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_validation: Option<bool>,
    /// PEM encoded leaf certificate.
    #[serde(default)]
    pub cert: String,
    /// PEM encoded private key. Only sent, never returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intermediates: Vec<SslIntermediate>,
    /// Subdomains the certificate is assigned to.
    #[serde(default)]
    pub subdomains: Vec<String>,
    /// Id of the certificate this upload replaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_to_refresh: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_refresh_forced: Option<bool>,
    /// Name of the [`SslConfiguration`] preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_configuration_name: Option<String>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified: Option<DateTime<Utc>>,
}

/// Named cipher/protocol preset (read only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslConfiguration {
    pub name: String,
    #[serde(default)]
    pub ciphers: String,
    #[serde(default)]
    pub protocols: String,
}
