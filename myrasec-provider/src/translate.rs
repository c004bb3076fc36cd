//! Shared build / set-back helpers.
//!
//! Build omits unset optional fields rather than zeroing them; timestamps are
//! RFC 3339 both ways and an empty value means "no timestamp".

use chrono::{DateTime, Utc};
use myrasec_api::utils::datetime::{format_rfc3339, parse_timestamp};
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};
use crate::state::ResourceData;

pub const CREATED: &str = "created";
pub const MODIFIED: &str = "modified";

/// Parse an optional RFC 3339 attribute.
pub fn parse_time(d: &ResourceData, key: &str) -> ProviderResult<Option<DateTime<Utc>>> {
    parse_time_str(key, d.get_str(key))
}

pub fn parse_time_str(key: &str, value: Option<&str>) -> ProviderResult<Option<DateTime<Utc>>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .map_err(|e| ProviderError::parse(key, format!("'{s}' is not RFC 3339: {e}"))),
    }
}

pub fn time_value(value: Option<&DateTime<Utc>>) -> Option<String> {
    value.map(format_rfc3339)
}

/// Write an optional timestamp; `None` removes the attribute.
pub fn set_time(d: &mut ResourceData, key: &str, value: Option<&DateTime<Utc>>) {
    d.set_opt(key, time_value(value));
}

/// `created` / `modified` pair every vendor object carries.
pub fn set_timestamps(
    d: &mut ResourceData,
    created: Option<&DateTime<Utc>>,
    modified: Option<&DateTime<Utc>>,
) {
    set_time(d, CREATED, created);
    set_time(d, MODIFIED, modified);
}

/// Set the opaque id and its `<resource>_id` mirror.
pub fn set_vendor_id(d: &mut ResourceData, mirror: &str, id: Option<i64>) {
    match id {
        Some(id) => {
            d.set_id(id);
            d.set(mirror, id);
        }
        None => d.remove(mirror),
    }
}

/// Optional string of a nested record; empty strings count as unset.
pub fn block_str(block: &Map<String, Value>, key: &str) -> Option<String> {
    block
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn block_i64(block: &Map<String, Value>, key: &str) -> Option<i64> {
    block.get(key).and_then(Value::as_i64)
}

pub fn block_bool(block: &Map<String, Value>, key: &str) -> Option<bool> {
    block.get(key).and_then(Value::as_bool)
}

/// Build a nested record from optional values, skipping `None`.
pub fn record<const N: usize>(entries: [(&str, Option<Value>); N]) -> Value {
    let map: Map<String, Value> = entries
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();
    Value::Object(map)
}
