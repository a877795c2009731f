//! Audio-type labels
//!
//! An audio track is labelled by a layout family crossed with a language
//! code (`mono-eng`, `surround-fra`). Only widths 1, 2 and 6 have a layout;
//! a track left at 3, 4 or 5 channels carries the `Unassigned` sentinel.

use serde::{Deserialize, Serialize};

/// Layout family of an audio track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioLayout {
    Mono,
    Stereo,
    Surround,
}

impl AudioLayout {
    /// Canonical channel width of the layout
    #[inline]
    pub fn channels(self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround => 6,
        }
    }

    /// Reverse lookup from a channel width; 3, 4 and 5 have no layout
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            6 => Some(Self::Surround),
            _ => None,
        }
    }

    /// Lowercase label stem
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::Stereo => "stereo",
            Self::Surround => "surround",
        }
    }
}

/// Audio-type label of a track
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioType {
    /// No label exists for the track's current width
    #[default]
    Unassigned,
    /// Layout family plus lowercase ISO-639-2 language code
    Assigned { layout: AudioLayout, language: String },
}

impl AudioType {
    pub fn assigned(layout: AudioLayout, language: impl Into<String>) -> Self {
        Self::Assigned {
            layout,
            language: language.into(),
        }
    }

    #[inline]
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    /// Layout family, when assigned
    pub fn layout(&self) -> Option<AudioLayout> {
        match self {
            Self::Assigned { layout, .. } => Some(*layout),
            Self::Unassigned => None,
        }
    }

    /// Language code, when assigned
    pub fn language(&self) -> Option<&str> {
        match self {
            Self::Assigned { language, .. } => Some(language),
            Self::Unassigned => None,
        }
    }

    /// Rendered label, e.g. `surround-fra`
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Assigned { layout, language } => Some(format!("{}-{}", layout.as_str(), language)),
            Self::Unassigned => None,
        }
    }

    /// Derive the label for a channel width, keeping the language when one
    /// is known. Widths without a layout come back `Unassigned`.
    pub fn for_channels(channels: u8, language: Option<&str>) -> Self {
        match (AudioLayout::from_channels(channels), language) {
            (Some(layout), Some(language)) => Self::assigned(layout, language),
            _ => Self::Unassigned,
        }
    }
}
