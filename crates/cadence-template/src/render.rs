// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! All-or-nothing placeholder substitution.

use std::collections::HashMap;

use cadence_core::CadenceError;

use crate::parser::placeholder_at;

/// Substitute every placeholder in `content` from `bindings`.
///
/// Fails with [`CadenceError::MissingBinding`] on the first placeholder
/// without a binding; no partial output is ever produced. Binding keys that
/// do not appear in the template are ignored, so forward-compatible payloads
/// with extra keys render cleanly.
pub fn render(content: &str, bindings: &HashMap<String, String>) -> Result<String, CadenceError> {
    let bytes = content.as_bytes();
    let mut out = String::with_capacity(content.len());
    let mut literal_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{'
            && let Some((start, end)) = placeholder_at(content, i)
        {
            let name = &content[start..end];
            let value = bindings
                .get(name)
                .ok_or_else(|| CadenceError::MissingBinding {
                    name: name.to_string(),
                })?;
            out.push_str(&content[literal_start..i]);
            out.push_str(value);
            i = end + 1;
            literal_start = i;
            continue;
        }
        i += 1;
    }
    out.push_str(&content[literal_start..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_variables;
    use proptest::prelude::*;

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_all_placeholders() {
        let out = render(
            "Hi {name}, your code is {code}",
            &bindings(&[("name", "Alice"), ("code", "1234")]),
        )
        .unwrap();
        assert_eq!(out, "Hi Alice, your code is 1234");
    }

    #[test]
    fn missing_binding_fails_without_partial_output() {
        // Bindings cover `name` but not `code`.
        let err = render(
            "Hi {name}, your code is {code}",
            &bindings(&[("name", "Alice")]),
        )
        .unwrap_err();
        match err {
            CadenceError::MissingBinding { name } => assert_eq!(name, "code"),
            other => panic!("expected MissingBinding, got {other}"),
        }
    }

    #[test]
    fn unknown_binding_keys_are_ignored() {
        let out = render(
            "Hi {name}",
            &bindings(&[("name", "Alice"), ("unused", "x")]),
        )
        .unwrap();
        assert_eq!(out, "Hi Alice");
    }

    #[test]
    fn malformed_braces_survive_as_literals() {
        let out = render("a {} b { c {name}", &bindings(&[("name", "x")])).unwrap();
        assert_eq!(out, "a {} b { c x");
    }

    #[test]
    fn repeated_placeholder_substituted_each_time() {
        let out = render("{name} and {name}", &bindings(&[("name", "Bob")])).unwrap();
        assert_eq!(out, "Bob and Bob");
    }

    #[test]
    fn rendered_output_has_no_leftover_placeholders() {
        let out = render(
            "🎉 {holiday_name} Special for {name}!",
            &bindings(&[("holiday_name", "Diwali"), ("name", "Asha")]),
        )
        .unwrap();
        assert!(extract_variables(&out).is_empty());
    }

    proptest! {
        // Round-trip property: when every variable is bound and values carry
        // no braces, rendering succeeds and leaves no extractable variables.
        #[test]
        fn render_is_total_over_fully_bound_templates(
            names in proptest::collection::vec("[a-z_][a-z0-9_]{0,8}", 1..5),
            values in proptest::collection::vec("[A-Za-z0-9 ]{0,12}", 5),
            filler in "[a-zA-Z0-9 .,!]{0,20}",
        ) {
            let mut content = String::new();
            for name in &names {
                content.push_str(&filler);
                content.push('{');
                content.push_str(name);
                content.push('}');
            }
            let bindings: HashMap<String, String> = names
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect();
            let out = render(&content, &bindings).expect("all variables bound");
            prop_assert!(extract_variables(&out).is_empty());
        }
    }
}
