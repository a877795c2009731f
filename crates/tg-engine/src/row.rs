//! Row model of the track grid
//!
//! A row pairs the committed baseline of a track with its in-progress
//! edit. The role records where the row came from: an unsplit original,
//! a split origin, a split-off child, or a passive extension of a
//! neighbour's growth. Parent/owner references are stable `RowId`s, so
//! they survive drag-reorder.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tg_core::Track;

/// Unique row ID generator
static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Stable row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(u64);

impl RowId {
    fn next() -> Self {
        Self(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get as u64
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Where a row came from and which of its sides are editable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowRole {
    /// Unsplit original row, both sides editable
    Normal,
    /// Split origin; one remaining split child per count
    SplitParent { split_count: u32 },
    /// Split-off single-channel child; its original slot lives with the parent
    SplitChild { parent: RowId },
    /// Passive extension of the owner's channel growth
    Absorbed { owner: RowId },
}

/// One editable entry of the track grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRow {
    pub id: RowId,
    /// Track as last committed
    pub original: Track,
    /// Track as currently edited
    pub transformation: Track,
    pub role: RowRole,
    /// Left-table checkbox state
    pub selected: bool,
}

impl TrackRow {
    /// Wrap a seed track into a fresh, unselected row
    pub fn new(track: Track) -> Self {
        Self {
            id: RowId::next(),
            original: track.clone(),
            transformation: track,
            role: RowRole::Normal,
            selected: false,
        }
    }

    /// The original slot was carved out of a parent row by a split
    #[inline]
    pub fn left_side_greyed_out(&self) -> bool {
        matches!(self.role, RowRole::SplitChild { .. })
    }

    /// The transformation slot mirrors the absorbing row's edit
    #[inline]
    pub fn right_side_greyed_out(&self) -> bool {
        matches!(self.role, RowRole::Absorbed { .. })
    }

    /// Split origin or unsplit original row
    #[inline]
    pub fn is_parent_row(&self) -> bool {
        matches!(self.role, RowRole::Normal | RowRole::SplitParent { .. })
    }

    /// Parent/owner back-reference, when the row has one
    pub fn parent_row(&self) -> Option<RowId> {
        match self.role {
            RowRole::SplitChild { parent } => Some(parent),
            RowRole::Absorbed { owner } => Some(owner),
            RowRole::Normal | RowRole::SplitParent { .. } => None,
        }
    }

    /// Projection of the row the way the grid renders it
    pub fn view(&self) -> RowView<'_> {
        RowView {
            id: self.id,
            original: &self.original,
            transformation: &self.transformation,
            selected: self.selected,
            left_side_greyed_out: self.left_side_greyed_out(),
            right_side_greyed_out: self.right_side_greyed_out(),
            is_parent_row: self.is_parent_row(),
            parent_row: self.parent_row(),
        }
    }
}

/// Render projection carrying the flag names the grid expects
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView<'a> {
    pub id: RowId,
    pub original: &'a Track,
    pub transformation: &'a Track,
    pub selected: bool,
    pub left_side_greyed_out: bool,
    pub right_side_greyed_out: bool,
    pub is_parent_row: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_row: Option<RowId>,
}

/// Last-known state of a row, kept so the next channel-count edit
/// computes its delta against what the user last saw rather than the
/// committed baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    pub transformation: Track,
    pub right_greyed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_core::AudioType;

    #[test]
    fn test_ids_are_unique() {
        let a = TrackRow::new(Track::audio("A", 1, AudioType::Unassigned));
        let b = TrackRow::new(Track::audio("B", 1, AudioType::Unassigned));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_role_accessors() {
        let mut row = TrackRow::new(Track::audio("A", 2, AudioType::Unassigned));
        assert!(row.is_parent_row());
        assert!(!row.left_side_greyed_out());
        assert!(!row.right_side_greyed_out());
        assert_eq!(row.parent_row(), None);

        let parent = row.id;
        row.role = RowRole::SplitChild { parent };
        assert!(row.left_side_greyed_out());
        assert!(!row.is_parent_row());
        assert_eq!(row.parent_row(), Some(parent));

        row.role = RowRole::Absorbed { owner: parent };
        assert!(row.right_side_greyed_out());
        assert!(!row.left_side_greyed_out());
    }

    #[test]
    fn test_view_wire_field_names() {
        let row = TrackRow::new(Track::audio("A", 1, AudioType::Unassigned));
        let json = serde_json::to_value(row.view()).unwrap();

        assert_eq!(json["leftSideGreyedOut"], false);
        assert_eq!(json["rightSideGreyedOut"], false);
        assert_eq!(json["isParentRow"], true);
        // no back-reference on a normal row
        assert!(json.get("parentRow").is_none());
    }
}
