//! Request-id generation and validation (§5). Every response carries an
//! `X-Request-ID`; callers may supply their own, but a malformed or
//! oversized one is replaced rather than rejected, so logging correlation
//! never blocks an otherwise-valid request.

/// Default accepted length (§A.4's `REQUEST_ID_MAX_LEN` default), used by
/// callers that don't have a configured override.
pub const DEFAULT_MAX_LEN: usize = 128;

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Accepts a caller-supplied request id if it is non-empty, no longer than
/// `max_len` characters, and composed only of ASCII alphanumerics, `-`, and
/// `_`. Otherwise generates a fresh one.
pub fn resolve(supplied: Option<&str>, max_len: usize) -> String {
    match supplied {
        Some(value)
            if !value.is_empty()
                && value.len() <= max_len
                && value.chars().all(is_allowed_char) =>
        {
            value.to_owned()
        }
        _ => generate(),
    }
}

/// Generates a fresh request id. Not a UUID library dependency: a 128-bit
/// value built from `getrandom` via the `tokio` runtime's RNG would be
/// overkill for a header that only needs to be unique enough to correlate
/// one request's log lines; this borrows process-local entropy instead.
fn generate() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let counter = NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    format!("req-{nanos:x}-{counter:x}")
}

static NEXT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_well_formed_supplied_id() {
        assert_eq!(resolve(Some("abc-123"), DEFAULT_MAX_LEN), "abc-123");
    }

    #[test]
    fn replaces_empty_id() {
        assert!(!resolve(Some(""), DEFAULT_MAX_LEN).is_empty());
    }

    #[test]
    fn replaces_oversized_id() {
        let oversized = "a".repeat(DEFAULT_MAX_LEN + 1);
        assert_ne!(resolve(Some(&oversized), DEFAULT_MAX_LEN), oversized);
    }

    #[test]
    fn replaces_id_with_disallowed_characters() {
        let replaced = resolve(Some("has spaces"), DEFAULT_MAX_LEN);
        assert_ne!(replaced, "has spaces");
    }

    #[test]
    fn generates_when_absent() {
        assert!(!resolve(None, DEFAULT_MAX_LEN).is_empty());
    }

    #[test]
    fn respects_a_narrower_configured_max_len() {
        assert_ne!(resolve(Some("abcdef"), 3), "abcdef");
        assert_eq!(resolve(Some("abc"), 3), "abc");
    }
}
