//! Domain and subdomain name canonicalization.
//!
//! Names are case-insensitive and tolerate a trailing dot. General-domain
//! labels (`ALL-example.com`, `ALL:example.com`) stand for every subdomain of
//! their parent and are kept verbatim.

const GENERAL_PREFIXES: [&str; 2] = ["ALL-", "ALL:"];

/// Whether `name` is a general-domain label.
pub fn is_general_domain(name: &str) -> bool {
    GENERAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Parent domain of a general-domain label.
pub fn general_domain_of(name: &str) -> Option<&str> {
    GENERAL_PREFIXES
        .iter()
        .find_map(|p| name.strip_prefix(p))
        .filter(|rest| !rest.is_empty())
}

/// Lowercase, trimmed, without trailing dot. General-domain labels pass
/// through unchanged.
pub fn canonical_name(name: &str) -> String {
    let name = name.trim();
    if is_general_domain(name) {
        return name.to_string();
    }
    name.trim_end_matches('.').to_lowercase()
}

/// Trailing-dot tolerant, case-insensitive comparison.
pub fn names_equal(a: &str, b: &str) -> bool {
    canonical_name(a) == canonical_name(b)
}

/// Upper-case normalizer (DNS record types, WAF directions of some presets).
pub fn upper(value: &str) -> String {
    value.trim().to_uppercase()
}
