use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A domain (DNS zone) managed by Myra.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Vendor identifier; `None` before creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Domain name (e.g. `"example.com"`).
    pub name: String,
    /// Let the vendor update the zone automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<bool>,
    /// Let the vendor manage DNS automatically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_dns: Option<bool>,
    /// Whether protection is paused for the domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// End of the pause window.
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub paused_until: Option<DateTime<Utc>>,
    /// Creation timestamp.
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,
    /// Last modification timestamp.
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub modified: Option<DateTime<Utc>>,
}

/// A subdomain (virtual host) below a [`Domain`].
///
/// The vendor identifies subdomains by their fully qualified name (`label`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VHost {
    /// Vendor identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Fully qualified name (e.g. `"www.example.com"`).
    #[serde(default)]
    pub label: String,
    /// Name of the owning domain, when the endpoint reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    /// Id of the owning domain, when the endpoint reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<i64>,
    /// Whether the subdomain is reachable through the vendor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<bool>,
    /// Whether a maintenance page is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<bool>,
    /// Whether protection is paused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// End of the pause window.
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub paused_until: Option<DateTime<Utc>>,
    /// Creation timestamp.
    #[serde(
        default,
        with = "crate::utils::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,
    /// Last modification timestamp.
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
    fn domain_without_id_omits_optional_fields() {
        let d = Domain {
            name: "example.com".to_string(),
            ..Domain::default()
        };
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"name":"example.com"}"#
        );
    }

    #[test]
    fn domain_deserializes_vendor_payload() {
        let d: Domain = serde_json::from_str(
            r#"{"id":7,"name":"example.com","autoUpdate":true,"paused":false,
                "created":"2024-01-15T09:00:00+0100","modified":"2024-01-16T09:00:00+01:00"}"#,
        )
        .unwrap();
        assert_eq!(d.id, Some(7));
        assert_eq!(d.auto_update, Some(true));
        assert!(d.created.is_some());
        assert!(d.paused_until.is_none());
    }

    #[test]
    fn vhost_reads_label_and_domain_name() {
        let v: VHost =
            serde_json::from_str(r#"{"id":3,"label":"www.example.com","domainName":"example.com"}"#)
                .unwrap();
        assert_eq!(v.label, "www.example.com");
        assert_eq!(v.domain_name.as_deref(), Some("example.com"));
    }
}
