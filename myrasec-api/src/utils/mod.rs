//! Utility modules.

/// RFC 3339 serde helpers for vendor timestamps.
pub mod datetime;

/// Log sanitization utilities to prevent credential and body exposure.
pub mod log_sanitizer;
