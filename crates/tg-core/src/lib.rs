//! tg-core: Shared types for the TrackGrid layout engine
//!
//! This crate provides the foundational types used across all TrackGrid
//! crates: the track model, audio-type labels, channel bounds, the error
//! taxonomy, and notification payloads.

mod audio_type;
mod error;
mod notify;
mod track;

pub use audio_type::*;
pub use error::*;
pub use notify::*;
pub use track::*;
