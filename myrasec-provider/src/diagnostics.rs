//! Diagnostic aggregation
//!
//! Handlers collect diagnostics in order and hand them back all at once.
//! Any [`Severity::Error`] fails the operation; warnings are rendered next to
//! a successful result.

use serde::Serialize;

use myrasec_api::ApiError;

use crate::error::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute the diagnostic refers to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        let detail = match err {
            ProviderError::VendorApi(api) => format_api_error(api),
            other => other.to_string(),
        };
        Self {
            severity: err.severity(),
            summary: err.summary().to_string(),
            detail,
            attribute: None,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        Self::from(&err)
    }
}

/// Render a vendor error for a diagnostic detail.
///
/// Violations expand to one `<field>: <message>` line per message; messages
/// without a field are listed verbatim. Every other error passes through its
/// `Display` form.
pub fn format_api_error(err: &ApiError) -> String {
    let map = err.violation_map();
    if map.is_empty() {
        return err.to_string();
    }
    let mut lines = Vec::new();
    for (field, messages) in map {
        for message in messages {
            if field.is_empty() {
                lines.push(message.to_string());
            } else {
                lines.push(format!("{field}: {message}"));
            }
        }
    }
    lines.join("\n")
}

/// Append-only ordered diagnostics stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.0.push(diagnostic.into());
    }

    pub fn error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::error(summary, detail));
    }

    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic::warning(summary, detail));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }
}

impl From<ProviderError> for Diagnostics {
    fn from(err: ProviderError) -> Self {
        Self(vec![err.into()])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myrasec_api::Violation;

    fn violation(path: Option<&str>, message: &str) -> Violation {
        Violation {
            property_path: path.map(str::to_string),
            message: message.to_string(),
        }
    }

    #[test]
    fn violations_expand_per_field() {
        let err = ApiError::Violation {
            violations: vec![
                violation(Some("ttl"), "must be at least 300"),
                violation(Some("name"), "is invalid"),
                violation(Some("ttl"), "must be a multiple of 60"),
            ],
        };
        assert_eq!(
            format_api_error(&err),
            "name: is invalid\nttl: must be at least 300\nttl: must be a multiple of 60"
        );
    }

    #[test]
    fn violations_without_field_pass_verbatim() {
        let err = ApiError::Violation {
            violations: vec![violation(None, "Domain is locked")],
        };
        assert_eq!(format_api_error(&err), "Domain is locked");
    }

    #[test]
    fn unstructured_errors_pass_through() {
        let err = ApiError::Unknown {
            status: None,
            raw_message: "boom".into(),
        };
        assert_eq!(format_api_error(&err), "boom");
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut diags = Diagnostics::new();
        diags.warning("Object not found", "gone");
        assert!(!diags.has_error());
        diags.push(ProviderError::KeyCertificateMismatch);
        assert!(diags.has_error());
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.errors().count(), 1);
    }

    #[test]
    fn vendor_error_diagnostic_uses_structured_detail() {
        let err = ProviderError::VendorApi(ApiError::Violation {
            violations: vec![violation(Some("value"), "invalid IP")],
        });
        let diag = Diagnostic::from(err);
        assert_eq!(diag.summary, "Myra API error");
        assert_eq!(diag.detail, "value: invalid IP");
    }
}
