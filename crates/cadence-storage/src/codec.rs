// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column codecs: RFC 3339 timestamps and JSON-encoded structured fields.
//!
//! Errors are mapped into `rusqlite::Error` conversion variants so query
//! closures can use `?` uniformly.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode a timestamp as sortable RFC 3339 text (`2026-01-01T00:00:00.000Z`).
pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Encode an optional timestamp.
pub(crate) fn encode_opt_ts(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(encode_ts)
}

/// Decode a timestamp column.
pub(crate) fn decode_ts(idx: usize, text: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode an optional timestamp column.
pub(crate) fn decode_opt_ts(
    idx: usize,
    text: Option<&str>,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    text.map(|t| decode_ts(idx, t)).transpose()
}

/// Encode a structured field as JSON text.
pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<String, rusqlite::Error> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// Decode a JSON text column.
pub(crate) fn decode_json<T: DeserializeOwned>(
    idx: usize,
    text: &str,
) -> Result<T, rusqlite::Error> {
    serde_json::from_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a status enum stored as lowercase text.
pub(crate) fn decode_enum<T>(idx: usize, text: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_round_trip() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
        let text = encode_ts(ts);
        assert!(text.ends_with('Z'));
        assert_eq!(decode_ts(0, &text).unwrap(), ts);
    }

    #[test]
    fn encoded_timestamps_sort_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        assert!(encode_ts(earlier) < encode_ts(later));
    }

    #[test]
    fn json_round_trips() {
        let tags = vec!["VIP".to_string(), "Lead".to_string()];
        let text = encode_json(&tags).unwrap();
        let back: Vec<String> = decode_json(0, &text).unwrap();
        assert_eq!(back, tags);
    }
}
