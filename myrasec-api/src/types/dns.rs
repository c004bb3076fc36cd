use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream (origin) options attached to an A/AAAA/CNAME record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fails: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
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

/// A DNS record of a [`Domain`](super::Domain).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Fully qualified record name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    /// `A`, `AAAA`, `MX`, `CNAME`, `TXT`, `NS`, `SRV` or `CAA`.
    pub record_type: String,
    pub value: String,
    /// CNAME the vendor assigns to protected records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_cname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_options: Option<UpstreamOptions>,
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
    fn record_round_trips_record_type_key() {
        let r = DnsRecord {
            name: "www.example.com".to_string(),
            record_type: "A".to_string(),
            value: "203.0.113.5".to_string(),
            ttl: Some(300),
            ..DnsRecord::default()
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["recordType"], "A");
        assert!(json.get("priority").is_none());
    }

    #[test]
    fn record_reads_upstream_options() {
        let r: DnsRecord = serde_json::from_str(
            r#"{"id":1,"name":"www.example.com","recordType":"A","value":"203.0.113.5",
                "upstreamOptions":{"id":9,"backup":false,"maxFails":100,"failTimeout":"1"}}"#,
        )
        .unwrap();
        let upstream = r.upstream_options.unwrap();
        assert_eq!(upstream.max_fails, Some(100));
        assert_eq!(upstream.fail_timeout.as_deref(), Some("1"));
    }
}
