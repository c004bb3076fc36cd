//! Log sanitization utilities
//!
//! Certificate bodies, private keys and HTML pages can be large; API keys and
//! secrets must never reach the log in full.

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 512;

/// Number of leading characters of a credential left visible.
const VISIBLE_PREFIX: usize = 4;

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Truncate a request/response body for logging.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Mask a credential, keeping only a short prefix.
///
/// `"abcdef123456"` → `"abcd********"`
pub fn mask_secret(s: &str) -> String {
    let visible: String = s.chars().take(VISIBLE_PREFIX).collect();
    let hidden = s.chars().count().saturating_sub(VISIBLE_PREFIX);
    format!("{visible}{}", "*".repeat(hidden))
}
