//! Search query sanitization (§4.8). Applied identically ahead of both the
//! stop and route text-search store calls, so the two endpoints can never
//! disagree about what counts as an empty query.

const BARE_OPERATORS: [&str; 4] = ["AND", "OR", "NOT", "NEAR"];

/// Strips characters that aren't letters, digits, or whitespace, drops any
/// *whole word* matching a bare boolean operator (case-insensitively), and
/// collapses runs of whitespace to single spaces. A query that sanitizes
/// down to nothing yields `None` rather than an empty-string query, so
/// callers can short-circuit straight to an empty result without issuing a
/// store call.
pub fn sanitize(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let words: Vec<&str> = stripped
        .split_whitespace()
        .filter(|word| !BARE_OPERATORS.iter().any(|op| op.eq_ignore_ascii_case(word)))
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_special_characters() {
        assert_eq!(sanitize("kiel; hbf!"), Some("kiel hbf".to_owned()));
    }

    #[test]
    fn drops_bare_boolean_operators_case_insensitively() {
        assert_eq!(sanitize("kiel AND hbf"), Some("kiel hbf".to_owned()));
        assert_eq!(sanitize("kiel and hbf"), Some("kiel hbf".to_owned()));
    }

    #[test]
    fn keeps_operator_words_embedded_in_longer_tokens() {
        assert_eq!(sanitize("andersen"), Some("andersen".to_owned()));
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(sanitize("kiel    hbf"), Some("kiel hbf".to_owned()));
    }

    #[test]
    fn empty_after_sanitize_yields_none() {
        assert_eq!(sanitize("AND OR"), None);
        assert_eq!(sanitize("!!!"), None);
        assert_eq!(sanitize(""), None);
    }
}
