//! Error types for TrackGrid

use thiserror::Error;

/// Core error type
///
/// The `#[error]` messages double as the notification text shown to the
/// user, so they stay short and free of internal jargon.
#[derive(Error, Debug)]
pub enum TgError {
    #[error("channel count must be between 1 and 6, got {0}")]
    ChannelCountOutOfRange(u8),

    #[error("the video track is not editable")]
    VideoImmutable,

    #[error("an audio type must be selected before it can be applied")]
    UnassignedAudioType,

    #[error("tracks '{0}' and '{1}' overlap in the file layout")]
    OverlappingTracks(String, String),
}

/// Result type alias
pub type TgResult<T> = Result<T, TgError>;
