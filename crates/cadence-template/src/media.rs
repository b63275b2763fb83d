// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media reference validation.
//!
//! Size limits are design constants, not render-time configuration.

use std::str::FromStr;

use cadence_core::{CadenceError, MediaKind, MediaRef};

/// Maximum image attachment size.
pub const IMAGE_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Maximum video attachment size.
pub const VIDEO_MAX_BYTES: u64 = 16 * 1024 * 1024;
/// Maximum audio attachment size.
pub const AUDIO_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// Size limit for the given media kind.
pub fn media_limit(kind: MediaKind) -> u64 {
    match kind {
        MediaKind::Image => IMAGE_MAX_BYTES,
        MediaKind::Video => VIDEO_MAX_BYTES,
        MediaKind::Audio => AUDIO_MAX_BYTES,
    }
}

/// Parse a media kind from caller-supplied text.
///
/// Anything outside the supported set fails with `UnsupportedMediaType`.
pub fn parse_kind(kind: &str) -> Result<MediaKind, CadenceError> {
    MediaKind::from_str(kind).map_err(|_| CadenceError::UnsupportedMediaType {
        kind: kind.to_string(),
    })
}

/// Validate a media reference against its kind's size limit.
pub fn validate_media(media: &MediaRef) -> Result<(), CadenceError> {
    let limit = media_limit(media.kind);
    if media.size_bytes > limit {
        return Err(CadenceError::MediaTooLarge {
            kind: media.kind,
            size_bytes: media.size_bytes,
            limit_bytes: limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(kind: MediaKind, size_bytes: u64) -> MediaRef {
        MediaRef {
            kind,
            url: "https://cdn.example.com/asset".to_string(),
            size_bytes,
        }
    }

    #[test]
    fn image_at_limit_passes() {
        assert!(validate_media(&media(MediaKind::Image, IMAGE_MAX_BYTES)).is_ok());
    }

    #[test]
    fn image_over_limit_fails() {
        let err = validate_media(&media(MediaKind::Image, IMAGE_MAX_BYTES + 1)).unwrap_err();
        assert!(matches!(
            err,
            CadenceError::MediaTooLarge {
                kind: MediaKind::Image,
                ..
            }
        ));
    }

    #[test]
    fn video_and_audio_share_the_larger_limit() {
        assert!(validate_media(&media(MediaKind::Video, VIDEO_MAX_BYTES)).is_ok());
        assert!(validate_media(&media(MediaKind::Audio, AUDIO_MAX_BYTES)).is_ok());
        assert!(validate_media(&media(MediaKind::Video, VIDEO_MAX_BYTES + 1)).is_err());
    }

    #[test]
    fn parse_kind_accepts_supported_kinds() {
        assert_eq!(parse_kind("image").unwrap(), MediaKind::Image);
        assert_eq!(parse_kind("video").unwrap(), MediaKind::Video);
        assert_eq!(parse_kind("audio").unwrap(), MediaKind::Audio);
    }

    #[test]
    fn parse_kind_rejects_unsupported_kinds() {
        let err = parse_kind("gif").unwrap_err();
        assert!(matches!(
            err,
            CadenceError::UnsupportedMediaType { kind } if kind == "gif"
        ));
    }
}
