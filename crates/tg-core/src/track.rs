//! Track model shared by the grid and the layout engine
//!
//! A track occupies a half-open range of the shared file-position space:
//! `[file_position, file_position + channels)`. The video track is pinned
//! to position 0 and is immutable in every editable field.

use serde::{Deserialize, Serialize};

use crate::AudioType;

/// Minimum channels per track
pub const MIN_TRACK_CHANNELS: u8 = 1;

/// Maximum channels per track
pub const MAX_TRACK_CHANNELS: u8 = 6;

/// Track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Video track (immutable, pinned at position 0)
    Video,
    /// Audio track (the editable kind)
    Audio,
}

impl TrackKind {
    #[inline]
    pub fn is_video(self) -> bool {
        self == Self::Video
    }

    #[inline]
    pub fn is_audio(self) -> bool {
        self == Self::Audio
    }
}

/// One track of the container layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Track kind
    pub kind: TrackKind,
    /// Component name shown in the grid
    pub component: String,
    /// Offset into the shared position space
    pub file_position: u32,
    /// Channel count (1-6)
    pub channels: u8,
    /// Audio-type label; `Unassigned` and meaningless for video
    pub audio_type: AudioType,
}

impl Track {
    /// Create the video track (position 0, single channel)
    pub fn video(component: impl Into<String>) -> Self {
        Self {
            kind: TrackKind::Video,
            component: component.into(),
            file_position: 0,
            channels: 1,
            audio_type: AudioType::Unassigned,
        }
    }

    /// Create an audio track; the engine assigns the real position
    pub fn audio(component: impl Into<String>, channels: u8, audio_type: AudioType) -> Self {
        Self {
            kind: TrackKind::Audio,
            component: component.into(),
            file_position: 0,
            channels,
            audio_type,
        }
    }

    /// One past the last position this track occupies
    #[inline]
    pub fn end_position(&self) -> u32 {
        self.file_position + self.channels as u32
    }

    /// Check if two tracks' position ranges overlap
    pub fn overlaps(&self, other: &Track) -> bool {
        self.file_position < other.end_position() && other.file_position < self.end_position()
    }

    /// Check the channel count against the editable bounds
    pub fn channels_in_bounds(&self) -> bool {
        (MIN_TRACK_CHANNELS..=MAX_TRACK_CHANNELS).contains(&self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_detection() {
        let mut a = Track::audio("A", 2, AudioType::Unassigned);
        let mut b = Track::audio("B", 1, AudioType::Unassigned);
        a.file_position = 1;
        b.file_position = 3;

        // [1,3) and [3,4) touch but do not overlap
        assert!(!a.overlaps(&b));

        b.file_position = 2;
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_channel_bounds() {
        let mut t = Track::audio("A", 6, AudioType::Unassigned);
        assert!(t.channels_in_bounds());

        t.channels = 7;
        assert!(!t.channels_in_bounds());

        t.channels = 0;
        assert!(!t.channels_in_bounds());
    }

    #[test]
    fn test_wire_field_names() {
        let track = Track::video("Video_1");
        let json = serde_json::to_value(&track).unwrap();

        assert_eq!(json["kind"], "Video");
        assert_eq!(json["filePosition"], 0);
        assert_eq!(json["audioType"], "Unassigned");
    }
}
