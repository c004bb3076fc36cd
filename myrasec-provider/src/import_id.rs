//! Composite import identifiers: `<scope>:<integer id>`.

use crate::error::{ProviderError, ProviderResult};

const SCOPED_GRAMMAR: &str = "<scope>:<integer id>";

/// Split `<scope>:<id>` on the first colon.
///
/// Both halves must be non-empty; the tail is a signed decimal integer.
pub fn parse_import_id(id: &str) -> ProviderResult<(String, i64)> {
    let malformed = || ProviderError::MalformedImportId {
        id: id.to_string(),
        expected: SCOPED_GRAMMAR.to_string(),
    };
    let (scope, tail) = id.split_once(':').ok_or_else(malformed)?;
    if scope.is_empty() || tail.is_empty() {
        return Err(malformed());
    }
    let entity_id = tail.parse::<i64>().map_err(|_| malformed())?;
    Ok((scope.to_string(), entity_id))
}

/// Scope-only identifier (settings, tag settings).
pub fn parse_scope_only(id: &str) -> ProviderResult<String> {
    let scope = id.trim();
    if scope.is_empty() {
        return Err(ProviderError::MalformedImportId {
            id: id.to_string(),
            expected: "<scope>".to_string(),
        });
    }
    Ok(scope.to_string())
}

/// Plain numeric identifier (tags, API keys).
pub fn parse_numeric_id(id: &str) -> ProviderResult<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| ProviderError::MalformedImportId {
            id: id.to_string(),
            expected: "<integer id>".to_string(),
        })
}
