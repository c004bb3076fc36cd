//! Typed filter blocks of the data sources.
//!
//! Every data source accepts an optional one-element `filter` list. The block
//! is deserialized into a record with explicit optional fields; a shape
//! mismatch becomes a `ParseError` diagnostic.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};

pub const FILTER: &str = "filter";

/// Parse the `filter` block of a data source configuration.
///
/// `Ok(None)` means no filter was given.
pub fn parse_filter<T: DeserializeOwned>(config: &Map<String, Value>) -> ProviderResult<Option<T>> {
    let block = match config.get(FILTER) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => match items.first() {
            None => return Ok(None),
            Some(first) => first.clone(),
        },
        Some(Value::Object(obj)) => Value::Object(obj.clone()),
        Some(other) => {
            log::debug!("[filters] unexpected filter shape: {other}");
            return Err(ProviderError::parse(FILTER, "expected a list with one filter block"));
        }
    };
    serde_json::from_value(block).map(Some).map_err(|e| {
        log::debug!("[filters] invalid filter block: {e}");
        ProviderError::parse(FILTER, e)
    })
}

/// Like [`parse_filter`] for data sources that cannot list without a scope.
pub fn require_filter<T: DeserializeOwned>(
    config: &Map<String, Value>,
    needs: &str,
) -> ProviderResult<T> {
    parse_filter(config)?
        .ok_or_else(|| ProviderError::parse(FILTER, format!("a filter block with {needs} is required")))
}

// ==================== Filter records ====================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainsFilter {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubdomainsFilter {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DnsRecordsFilter {
    pub domain_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub record_type: Option<String>,
}

/// Filters that only carry a subdomain scope plus an optional search term.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubdomainFilter {
    pub subdomain_name: String,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettingsFilter {
    pub subdomain_name: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectsFilter {
    pub subdomain_name: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitsFilter {
    pub subdomain_name: String,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpFiltersFilter {
    pub subdomain_name: String,
    #[serde(default, rename = "type")]
    pub filter_type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaintenanceTemplatesFilter {
    pub domain_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorPagesFilter {
    pub domain_name: String,
    #[serde(default)]
    pub subdomain_name: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SslCertificatesFilter {
    pub domain_name: String,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Name filter of the account wide read-only catalogs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameFilter {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WafRulesFilter {
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub subdomain_name: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagsFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub tag_type: Option<String>,
}

/// Scope of the tag owned collections.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagFilter {
    pub tag_id: i64,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitingRoomsFilter {
    #[serde(default)]
    pub domain_id: Option<i64>,
    #[serde(default)]
    pub subdomain_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IpRangesFilter {
    #[serde(default)]
    pub network: Option<String>,
}
