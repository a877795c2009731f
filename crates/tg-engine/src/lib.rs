//! tg-engine: Track row split/merge/reposition engine
//!
//! Owns the ordered row sequence behind the track-editing grid and every
//! mutation over it: split, remove, channel-count growth/shrink with
//! absorption, audio-type reassignment, drag-reorder, position
//! recomputation, validation and commit/rollback.

mod engine;
mod row;

pub use engine::*;
pub use row::*;
