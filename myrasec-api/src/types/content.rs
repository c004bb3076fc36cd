//! HTML content objects: maintenance pages, maintenance templates, error pages
//! and waiting rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduled maintenance page of a subdomain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
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

/// Reusable maintenance page body of a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub content: String,
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

/// Custom error page served for an HTTP status of a subdomain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sub_domain_name: String,
    /// One of `400, 405, 429, 500, 502, 503, 504, 9999`.
    pub error_code: i64,
    #[serde(default)]
    pub content: String,
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

/// Waiting room placed in front of a subdomain when concurrency overflows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingRoom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vhost_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_domain_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_refresh: Option<i64>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_uses_camel_case() {
        let p = ErrorPage {
            sub_domain_name: "www.example.com".to_string(),
            error_code: 502,
            content: "<html/>".to_string(),
            ..ErrorPage::default()
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["subDomainName"], "www.example.com");
        assert_eq!(json["errorCode"], 502);
    }

    #[test]
    fn waiting_room_reads_paths() {
        let w: WaitingRoom = serde_json::from_str(
            r#"{"id":4,"vhostId":12,"name":"queue","paths":["/queue","/shop"],"maxConcurrent":500}"#,
        )
        .unwrap();
        assert_eq!(w.paths.len(), 2);
        assert_eq!(w.vhost_id, Some(12));
        assert!(w.content.is_empty());
    }
}
