//! 日期时间序列化/反序列化工具
//!
//! Myra API 的时间戳均为 RFC 3339 字符串，但部分旧接口返回不带冒号的时区偏移
//! （如 `2024-01-15T08:00:00+0100`）。
//! - 序列化: `Option<DateTime<Utc>>` -> RFC 3339 字符串 / null
//! - 反序列化: RFC 3339 或 `%Y-%m-%dT%H:%M:%S%z` -> `DateTime<Utc>`，空字符串视为 null

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// 序列化 `Option<DateTime<Utc>>` 为 RFC 3339 字符串
pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => serializer.serialize_some(&format_rfc3339(dt)),
        None => serializer.serialize_none(),
    }
}

/// 反序列化：支持 RFC 3339 与无冒号时区偏移两种格式
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<String>::deserialize(deserializer)? {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .map_err(|e| Error::custom(format!("Invalid RFC3339 timestamp '{s}': {e}"))),
        None => Ok(None),
    }
}

/// 解析时间戳字符串
///
/// 先按 RFC 3339 解析，失败后尝试 `+0100` 形式的偏移。
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| rfc_err),
    }
}

/// 格式化为 RFC 3339（秒精度，`Z` 后缀）
pub fn format_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Stamped {
        #[serde(default, with = "super", skip_serializing_if = "Option::is_none")]
        created: Option<DateTime<Utc>>,
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_timestamp("2024-01-15T09:00:00+01:00").unwrap();
        assert_eq!(format_rfc3339(&dt), "2024-01-15T08:00:00Z");
    }

    #[test]
    fn parses_offset_without_colon() {
        let dt = parse_timestamp("2024-01-15T09:00:00+0100").unwrap();
        assert_eq!(format_rfc3339(&dt), "2024-01-15T08:00:00Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn empty_string_deserializes_to_none() {
        let s: Stamped = serde_json::from_str(r#"{"created":""}"#).unwrap();
        assert!(s.created.is_none());
    }

    #[test]
    fn missing_field_is_omitted_on_serialize() {
        let s: Stamped = serde_json::from_str("{}").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "{}");
    }
}
