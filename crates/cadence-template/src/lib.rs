// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template rendering for the Cadence campaign engine.
//!
//! Placeholders use `{identifier}` syntax (alphanumeric plus underscore).
//! Malformed braces are literal text, never variables. Rendering is
//! all-or-nothing: a single missing binding fails the whole render, so
//! partial text can never reach a delivery channel.
//!
//! The `{...}` grammar here is deliberately narrower than any off-the-shelf
//! template engine: unmatched braces must survive as literal content (the
//! campaign copy frequently contains emoji and punctuation runs), which
//! rules out engines that treat them as syntax errors.

mod media;
mod parser;
mod render;

pub use media::{
    AUDIO_MAX_BYTES, IMAGE_MAX_BYTES, VIDEO_MAX_BYTES, media_limit, parse_kind, validate_media,
};
pub use parser::extract_variables;
pub use render::render;
