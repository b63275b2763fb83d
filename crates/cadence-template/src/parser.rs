// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Placeholder extraction.

/// Scan `content` at byte offset `open` (which must point at `{`) for a
/// well-formed placeholder. Returns the identifier range `(start, end)` of
/// the name when the braces enclose a non-empty `[A-Za-z0-9_]+` run.
pub(crate) fn placeholder_at(content: &str, open: usize) -> Option<(usize, usize)> {
    let bytes = content.as_bytes();
    let start = open + 1;
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    // Empty name ({}) or missing close brace: literal text.
    if end > start && bytes.get(end) == Some(&b'}') {
        Some((start, end))
    } else {
        None
    }
}

/// Extract the distinct placeholder names from `content`, in order of first
/// appearance.
pub fn extract_variables(content: &str) -> Vec<String> {
    let bytes = content.as_bytes();
    let mut vars: Vec<String> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{'
            && let Some((start, end)) = placeholder_at(content, i)
        {
            let name = &content[start..end];
            if !vars.iter().any(|v| v == name) {
                vars.push(name.to_string());
            }
            i = end + 1;
            continue;
        }
        i += 1;
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order_of_first_appearance() {
        let vars = extract_variables("Hi {name}, your code is {code}. Bye {name}!");
        assert_eq!(vars, vec!["name", "code"]);
    }

    #[test]
    fn empty_content_has_no_variables() {
        assert!(extract_variables("").is_empty());
        assert!(extract_variables("plain text only").is_empty());
    }

    #[test]
    fn unmatched_open_brace_is_literal() {
        assert!(extract_variables("unclosed {name and more").is_empty());
    }

    #[test]
    fn empty_braces_are_literal() {
        assert!(extract_variables("empty {} braces").is_empty());
    }

    #[test]
    fn invalid_identifier_characters_are_literal() {
        assert!(extract_variables("{first name}").is_empty());
        assert!(extract_variables("{na-me}").is_empty());
    }

    #[test]
    fn underscores_and_digits_allowed() {
        let vars = extract_variables("{promo_code} expires {expiry_2}");
        assert_eq!(vars, vec!["promo_code", "expiry_2"]);
    }

    #[test]
    fn adjacent_placeholders() {
        let vars = extract_variables("{a}{b}{a}");
        assert_eq!(vars, vec!["a", "b"]);
    }

    #[test]
    fn survives_multibyte_text_around_placeholders() {
        let vars = extract_variables("🎉 {holiday_name} Special for {name}! 🎊");
        assert_eq!(vars, vec!["holiday_name", "name"]);
    }

    #[test]
    fn brace_directly_before_placeholder() {
        // The outer brace has no valid identifier run, the inner one does.
        let vars = extract_variables("{{name}}");
        assert_eq!(vars, vec!["name"]);
    }
}
