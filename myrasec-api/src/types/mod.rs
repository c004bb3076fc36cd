//! Data transfer objects of the Myra REST API.
//!
//! Every optional field is `Option<_>` and omitted from request bodies when
//! `None`, so partially populated objects never zero out vendor state.

mod account;
mod content;
mod dns;
mod domain;
mod policy;
mod settings;
mod ssl;
mod tag;
mod waf;

use serde::{Deserialize, Serialize};

use crate::error::Violation;

pub use account::{ApiKey, IpRange};
pub use content::{ErrorPage, Maintenance, MaintenanceTemplate, WaitingRoom};
pub use dns::{DnsRecord, UpstreamOptions};
pub use domain::{Domain, VHost};
pub use policy::{CacheSetting, IpFilter, RateLimit, Redirect};
pub use settings::Settings;
pub use ssl::{SslCertificate, SslConfiguration, SslIntermediate};
pub use tag::{Tag, TagAssignment, TagInformation};
pub use waf::{WafAction, WafCondition, WafRule};

// ============ Pagination ============

/// Default page size used by most list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// Page size used by the maintenance and maintenance-template endpoints.
pub const MAINTENANCE_PAGE_SIZE: u32 = 100;

/// Query parameters for list endpoints.
///
/// Pages are 1-indexed. `search` narrows results server side; together with
/// `filter_type = "exact"` the vendor only returns exact matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
    /// Optional server-side search term.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Optional match mode for `search` (`"exact"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            filter_type: None,
        }
    }
}

impl ListParams {
    /// First page with the given page size.
    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Set the server-side search term.
    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Ask the vendor for exact matches of `search` only.
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.filter_type = Some("exact".to_string());
        self
    }

    /// Same query, different page.
    #[must_use]
    pub fn page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Render as URL query pairs.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(filter_type) = &self.filter_type {
            query.push(("filterType".to_string(), filter_type.clone()));
        }
        query
    }
}

// ============ Response envelope ============

/// Response envelope shared by every Myra endpoint.
///
/// List endpoints fill `list`, write endpoints fill `target_object`, and
/// failures set `error` and `violation_list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiResponse<T> {
    #[serde(default)]
    pub error: bool,
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(default = "Vec::new")]
    pub target_object: Vec<T>,
    #[serde(default)]
    pub violation_list: Vec<Violation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_first_page_of_250() {
        let p = ListParams::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 250);
    }

    #[test]
    fn query_contains_search_and_filter_type() {
        let q = ListParams::default().search("www.example.com").exact().to_query();
        assert!(q.contains(&("search".to_string(), "www.example.com".to_string())));
        assert!(q.contains(&("filterType".to_string(), "exact".to_string())));
    }

    #[test]
    fn empty_search_is_not_sent() {
        let q = ListParams::default().search("").to_query();
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn page_keeps_filters() {
        let p = ListParams::with_page_size(100).search("x").page(3);
        assert_eq!(p.page, 3);
        assert_eq!(p.page_size, 100);
        assert_eq!(p.search.as_deref(), Some("x"));
    }

    #[test]
    fn envelope_defaults_missing_collections() {
        let r: ApiResponse<serde_json::Value> = serde_json::from_str(r#"{"error":false}"#).unwrap();
        assert!(r.list.is_empty());
        assert!(r.target_object.is_empty());
        assert!(r.violation_list.is_empty());
    }

    #[test]
    fn envelope_reads_violations() {
        let r: ApiResponse<serde_json::Value> = serde_json::from_str(
            r#"{"error":true,"violationList":[{"propertyPath":"ttl","message":"too small"}]}"#,
        )
        .unwrap();
        assert!(r.error);
        assert_eq!(r.violation_list[0].property_path.as_deref(), Some("ttl"));
    }
}
