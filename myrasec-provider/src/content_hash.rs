//! Content-hash drift suppression for large HTML bodies.
//!
//! State keeps `content` empty and `content_hash` set to the SHA-256 of the
//! body the vendor holds. A configured body whose hash equals the stored one
//! is not drift.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;

pub const CONTENT: &str = "content";
pub const CONTENT_HASH: &str = "content_hash";

/// Lowercase hex SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Diff suppressor for `content`: equal hash means no change.
pub fn suppress_content_diff(
    _key: &str,
    _old: &Value,
    new: &Value,
    state: &Map<String, Value>,
) -> bool {
    match (new.as_str(), state.get(CONTENT_HASH).and_then(Value::as_str)) {
        (Some(new), Some(stored)) if !stored.is_empty() => content_hash(new) == stored,
        _ => false,
    }
}

/// Add the `content` / `content_hash` pair to a schema.
pub fn with_content_fields(schema: ResourceSchema) -> ResourceSchema {
    schema
        .field(
            CONTENT,
            Schema::string()
                .required()
                .diff_suppress(suppress_content_diff)
                .describe("HTML body. Stored as its SHA-256 only."),
        )
        .field(CONTENT_HASH, Schema::string().computed())
}

/// Write back: empty body, fresh hash.
pub fn set_content(d: &mut ResourceData, content: &str) {
    d.set(CONTENT, "");
    d.set(CONTENT_HASH, content_hash(content));
}
