// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number canonicalization.

use cadence_core::CadenceError;

/// Canonicalize a phone number to `+` followed by digits only.
///
/// Accepts the usual human formatting (spaces, dashes, dots, parentheses,
/// an optional leading `+`). Anything else, or a digit count outside the
/// E.164 range, is a validation error.
pub fn canonical_phone(input: &str) -> Result<String, CadenceError> {
    let trimmed = input.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            other => {
                return Err(CadenceError::Validation(format!(
                    "phone number contains invalid character `{other}`"
                )));
            }
        }
    }

    if !(7..=15).contains(&digits.len()) {
        return Err(CadenceError::Validation(format!(
            "phone number must have 7 to 15 digits, got {}",
            digits.len()
        )));
    }

    Ok(format!("+{digits}"))
}
