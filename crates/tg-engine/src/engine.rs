//! Track layout engine
//!
//! One mutation surface over the ordered row sequence:
//! - split a multi-channel row into per-channel sub-rows
//! - grow/shrink a row's channel count, absorbing or releasing neighbours
//! - reassign audio types, displacing exactly the channel-width required
//! - drag-reorder with the video row pinned at the top
//! - canonical position recomputation after every structural change
//! - validation-gated commit and rollback against the committed baseline
//!
//! Everything runs synchronously on the caller's thread; the engine owns
//! its state exclusively and collaborators only read projections and
//! drain the notice channel.

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tg_core::{
    AudioLayout, AudioType, Notice, TgError, TgResult, Track, MAX_TRACK_CHANNELS,
    MIN_TRACK_CHANNELS,
};

use crate::{RowId, RowRole, RowSnapshot, RowView, TrackRow};

/// The track layout engine
///
/// Owns the row sequence, the committed baseline and the per-row snapshot
/// cache. Intent methods mutate in place and report failures through the
/// notice channel; they never leave the sequence half-edited.
pub struct LayoutEngine {
    rows: Vec<TrackRow>,
    /// Deep clone of the last committed state, restored by `rollback`
    committed: Vec<TrackRow>,
    /// Last-known per-row state, the reference point for channel deltas
    snapshots: HashMap<RowId, RowSnapshot>,
    notice_tx: Sender<Notice>,
    notice_rx: Receiver<Notice>,
    revision: u64,
    refresh: bool,
    next_track_no: u32,
}

impl LayoutEngine {
    /// Build an engine from a seed track list. The first seed entry is
    /// expected to be the video track; rows start unsplit and unselected
    /// and the result is immediately captured as the committed baseline.
    pub fn new(seed: Vec<Track>) -> Self {
        let (notice_tx, notice_rx) = unbounded();
        let rows: Vec<TrackRow> = seed.into_iter().map(TrackRow::new).collect();
        let mut engine = Self {
            rows,
            committed: Vec::new(),
            snapshots: HashMap::new(),
            notice_tx,
            notice_rx,
            revision: 0,
            refresh: false,
            next_track_no: 1,
        };
        engine.recompute_positions();
        engine.committed = engine.rows.clone();
        engine
    }

    /// The canonical five-row demo layout
    pub fn demo() -> Self {
        Self::new(vec![
            Track::video("Video_1"),
            Track::audio("Mono_1", 1, AudioType::assigned(AudioLayout::Mono, "eng")),
            Track::audio("Mono_2", 1, AudioType::assigned(AudioLayout::Mono, "eng")),
            Track::audio(
                "English Stereo",
                2,
                AudioType::assigned(AudioLayout::Stereo, "eng"),
            ),
            Track::audio(
                "English Surround",
                6,
                AudioType::assigned(AudioLayout::Surround, "eng"),
            ),
        ])
    }

    // ═══════════════════════════════════════════════════════════════════
    // INTENT SURFACE
    // ═══════════════════════════════════════════════════════════════════

    /// Change a row's channel count.
    ///
    /// Growth walks forward and absorbs one editable row per added
    /// channel; multi-channel targets are split down to a standalone
    /// single channel first so their spare capacity survives as split
    /// children. Shrink releases the absorbed rows again, last first.
    pub fn change_channel_count(&mut self, id: RowId, new_count: u8) {
        if !(MIN_TRACK_CHANNELS..=MAX_TRACK_CHANNELS).contains(&new_count) {
            self.reject(TgError::ChannelCountOutOfRange(new_count));
            return;
        }
        let Some(idx) = self.index_of(id) else { return };
        if self.rows[idx].transformation.kind.is_video() {
            self.reject(TgError::VideoImmutable);
            return;
        }
        if self.rows[idx].right_side_greyed_out() {
            return;
        }

        let previous = self
            .snapshots
            .get(&id)
            .map(|snap| snap.transformation.channels)
            .unwrap_or(self.rows[idx].original.channels);

        self.rows[idx].transformation.channels = new_count;
        if new_count > previous {
            self.grow(idx, new_count - previous);
            log::debug!(
                "grew '{}' from {previous} to {new_count} channels",
                self.rows[idx].transformation.component
            );
        } else {
            self.shrink(idx, previous - new_count);
        }

        self.recompute_positions();
        self.refresh_snapshots();
        self.bump();
    }

    /// Carve one channel off a multi-channel row into a new
    /// single-channel child inserted immediately after it.
    pub fn split_row(&mut self, id: RowId) {
        let Some(idx) = self.index_of(id) else { return };
        if !matches!(
            self.rows[idx].role,
            RowRole::Normal | RowRole::SplitParent { .. }
        ) {
            return;
        }
        if self.split_at(idx) {
            self.recompute_positions();
            self.refresh_snapshots();
            self.bump();
        }
    }

    /// Discard a split-off child row, giving its channel back to the
    /// parent. Exact inverse of `split_row` for channel count and layout.
    pub fn remove_row(&mut self, id: RowId) {
        let Some(idx) = self.index_of(id) else { return };
        if !self.rows[idx].transformation.kind.is_audio() {
            return;
        }
        let RowRole::SplitChild { parent } = self.rows[idx].role else {
            return;
        };

        let removed = self.rows.remove(idx);
        self.snapshots.remove(&removed.id);
        self.release_absorbed(removed.id);
        if let Some(row) = self.row_by_id_mut(parent) {
            row.original.channels += 1;
            row.transformation.channels += 1;
            row.role = decrement_split(row.role);
        }
        log::info!("removed split row '{}'", removed.transformation.component);

        self.recompute_positions();
        self.refresh_snapshots();
        self.bump();
    }

    /// Reassign a row's audio type. When the new layout is wider than the
    /// row, the shortfall is reclaimed from forward rows in channel-width:
    /// multi-channel rows donate one split-off channel at a time,
    /// single-channel rows are displaced outright.
    pub fn change_audio_type(&mut self, id: RowId, new_type: AudioType) {
        let Some(idx) = self.index_of(id) else { return };
        if self.rows[idx].transformation.kind.is_video() {
            self.reject(TgError::VideoImmutable);
            return;
        }
        if self.rows[idx].right_side_greyed_out() {
            return;
        }
        let (Some(layout), Some(label)) = (new_type.layout(), new_type.label()) else {
            self.reject(TgError::UnassignedAudioType);
            return;
        };

        let width = layout.channels();
        let current = self.rows[idx].transformation.channels;
        if width > current {
            self.reclaim(idx, (width - current) as u32);
        }

        let row = &mut self.rows[idx];
        row.transformation.channels = width;
        row.transformation.audio_type = new_type;
        row.transformation.component = label;

        self.recompute_positions();
        self.refresh_snapshots();
        self.bump();
    }

    /// Move a row within the sequence. The video row is pinned: a drag
    /// from or onto index 0 is ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from == 0 || to == 0 || from == to {
            return;
        }
        if from >= self.rows.len() || to >= self.rows.len() {
            return;
        }
        let row = self.rows.remove(from);
        self.rows.insert(to, row);

        self.recompute_positions();
        self.refresh_snapshots();
        self.bump();
    }

    /// Flip a row's checkbox. Deselecting discards the row's pending
    /// edit: its absorbed rows are released and its transformation is
    /// reset from the baseline.
    pub fn toggle_select(&mut self, id: RowId) {
        let Some(idx) = self.index_of(id) else { return };
        if self.rows[idx].transformation.kind.is_video()
            || self.rows[idx].right_side_greyed_out()
        {
            return;
        }

        let selected = !self.rows[idx].selected;
        self.rows[idx].selected = selected;
        if !selected {
            self.release_absorbed(id);
            let row = &mut self.rows[idx];
            row.transformation = row.original.clone();
            self.snapshots.remove(&id);
            self.recompute_positions();
            self.refresh_snapshots();
        }
        self.bump();
    }

    /// Append a fresh unassigned single-channel audio row.
    pub fn add_row(&mut self) {
        let component = format!("Track {}", self.next_track_no);
        self.next_track_no += 1;
        let mut row = TrackRow::new(Track::audio(component, 1, AudioType::Unassigned));
        row.selected = true;
        self.rows.push(row);

        self.recompute_positions();
        self.refresh_snapshots();
        self.bump();
    }

    /// Re-derive every file position from the sequence order. This is the
    /// only place positions are authoritative after a structural change.
    ///
    /// The video row keeps position 0; every following row that occupies
    /// independent space is placed at the running offset on both sides.
    /// Absorbed rows are skipped and their transformation mirror is then
    /// refreshed from the owning row. Idempotent.
    pub fn recompute_positions(&mut self) {
        let mut offset = 0u32;
        for row in &mut self.rows {
            if row.transformation.kind.is_video() {
                row.original.file_position = 0;
                row.transformation.file_position = 0;
                offset += u32::from(row.transformation.channels);
                continue;
            }
            if row.right_side_greyed_out() {
                continue;
            }
            row.original.file_position = offset;
            row.transformation.file_position = offset;
            offset += u32::from(row.transformation.channels);
        }

        let mirrors: Vec<(usize, Track)> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| match row.role {
                RowRole::Absorbed { owner } => {
                    self.resolve_owner(owner).map(|track| (i, track))
                }
                _ => None,
            })
            .collect();
        for (i, track) in mirrors {
            self.rows[i].transformation = track;
        }
    }

    /// Check the whole layout, emitting a notice for the first problem
    /// found. Gates `commit`.
    pub fn validate_all(&self) -> bool {
        match self.check_layout() {
            Ok(()) => true,
            Err(err) => {
                self.reject(err);
                false
            }
        }
    }

    /// Promote the current edits to the committed baseline.
    pub fn commit(&mut self) {
        if !self.validate_all() {
            return;
        }
        for row in &mut self.rows {
            row.original = row.transformation.clone();
        }
        self.committed = self.rows.clone();
        self.snapshots.clear();
        log::info!("committed track layout ({} rows)", self.rows.len());
        let _ = self.notice_tx.send(Notice::info("track layout updated"));
        self.bump();
    }

    /// Discard every pending edit and restore the committed baseline.
    pub fn rollback(&mut self) {
        self.rows = self.committed.clone();
        self.snapshots.clear();
        log::info!("rolled back to last committed layout");
        self.bump();
    }

    // ═══════════════════════════════════════════════════════════════════
    // READ SURFACE
    // ═══════════════════════════════════════════════════════════════════

    /// Current ordered row sequence
    pub fn rows(&self) -> &[TrackRow] {
        &self.rows
    }

    /// Look a row up by id
    pub fn row(&self, id: RowId) -> Option<&TrackRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Render projection of every row, in order
    pub fn render(&self) -> Vec<RowView<'_>> {
        self.rows.iter().map(TrackRow::view).collect()
    }

    /// Ids of the rows whose edit differs from the baseline
    pub fn changed_rows(&self) -> Vec<RowId> {
        self.rows
            .iter()
            .filter(|row| row.transformation != row.original)
            .map(|row| row.id)
            .collect()
    }

    /// Monotone counter bumped by every completed mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// View-refresh flag; reading it clears it
    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh)
    }

    /// Receiver half of the notification channel
    pub fn notices(&self) -> Receiver<Notice> {
        self.notice_rx.clone()
    }

    // ═══════════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════════

    fn index_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    fn row_by_id_mut(&mut self, id: RowId) -> Option<&mut TrackRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    fn reject(&self, err: TgError) {
        log::warn!("rejected edit: {err}");
        let _ = self.notice_tx.send(Notice::error(err.to_string()));
    }

    fn bump(&mut self) {
        self.revision += 1;
        self.refresh = true;
    }

    /// Absorb `delta` forward editable rows into the row at `owner_idx`.
    fn grow(&mut self, owner_idx: usize, delta: u8) {
        let owner_id = self.rows[owner_idx].id;
        for _ in 0..delta {
            let Some(target) = self.next_editable_after(owner_idx) else {
                break;
            };
            // a multi-channel target is split down to a standalone single
            // channel first so its spare capacity survives as children
            while self.can_split(target) {
                self.split_at(target);
            }
            let mirror = self.rows[owner_idx].transformation.clone();
            let row = &mut self.rows[target];
            row.transformation = mirror;
            row.role = RowRole::Absorbed { owner: owner_id };
        }
    }

    /// Release `delta` rows absorbed by the row at `owner_idx`, each time
    /// the last one of the contiguous right-greyed run that follows it.
    fn shrink(&mut self, owner_idx: usize, delta: u8) {
        let owner_id = self.rows[owner_idx].id;
        for _ in 0..delta {
            let mut last_owned = None;
            for i in owner_idx + 1..self.rows.len() {
                match self.rows[i].role {
                    RowRole::Absorbed { owner } => {
                        if owner == owner_id {
                            last_owned = Some(i);
                        }
                    }
                    _ => break,
                }
            }
            let Some(i) = last_owned else { break };
            self.restore_row(i);
        }
    }

    /// Next row after `idx` that can be edited or absorbed: audio and not
    /// already a passive extension. Always skips the video row.
    fn next_editable_after(&self, idx: usize) -> Option<usize> {
        (idx + 1..self.rows.len()).find(|&i| {
            let row = &self.rows[i];
            row.transformation.kind.is_audio() && !row.right_side_greyed_out()
        })
    }

    /// Hand an absorbed row its own state back.
    fn restore_row(&mut self, idx: usize) {
        let row = &mut self.rows[idx];
        row.transformation = row.original.clone();
        row.role = RowRole::Normal;
        let id = row.id;
        self.snapshots.remove(&id);
    }

    fn owns_absorbed(&self, owner_id: RowId) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(row.role, RowRole::Absorbed { owner } if owner == owner_id))
    }

    /// Release every row currently absorbed by `owner_id`.
    fn release_absorbed(&mut self, owner_id: RowId) {
        for i in 0..self.rows.len() {
            if matches!(self.rows[i].role, RowRole::Absorbed { owner } if owner == owner_id) {
                self.restore_row(i);
            }
        }
    }

    fn can_split(&self, idx: usize) -> bool {
        let row = &self.rows[idx];
        row.transformation.kind.is_audio()
            && matches!(row.role, RowRole::Normal | RowRole::SplitParent { .. })
            && row.original.channels > 1
            && row.transformation.channels > 1
    }

    /// Split one channel off the row at `idx` into a child row inserted
    /// right after it. Both sides of the source are decremented and
    /// re-labelled from their remaining width. Positions are NOT
    /// recomputed here; callers do that once per operation.
    fn split_at(&mut self, idx: usize) -> bool {
        if !self.can_split(idx) {
            return false;
        }
        let child = {
            let row = &mut self.rows[idx];
            let language = row.transformation.audio_type.language().map(str::to_owned);
            let original_language = row.original.audio_type.language().map(str::to_owned);

            row.original.channels -= 1;
            row.transformation.channels -= 1;
            row.original.audio_type =
                AudioType::for_channels(row.original.channels, original_language.as_deref());
            row.transformation.audio_type =
                AudioType::for_channels(row.transformation.channels, language.as_deref());
            row.role = match row.role {
                RowRole::SplitParent { split_count } => RowRole::SplitParent {
                    split_count: split_count + 1,
                },
                _ => RowRole::SplitParent { split_count: 1 },
            };

            let track = Track::audio(
                row.transformation.component.clone(),
                1,
                AudioType::for_channels(1, language.as_deref()),
            );
            let mut child = TrackRow::new(track);
            child.role = RowRole::SplitChild { parent: row.id };
            child.selected = row.selected;
            child
        };
        self.rows.insert(idx + 1, child);
        true
    }

    /// Reclaim `need` channels of forward space for the row at `idx`,
    /// never more, never fewer (unless the sequence runs out first).
    fn reclaim(&mut self, idx: usize, mut need: u32) {
        let mut i = idx + 1;
        while need > 0 && i < self.rows.len() {
            let row = &self.rows[i];
            if !row.transformation.kind.is_audio() || row.right_side_greyed_out() {
                i += 1;
                continue;
            }
            // a grown row is shrunk back to its own width first, so the
            // rows it absorbed re-enter the scan at their real widths and
            // the accounting below stays exact
            let id = row.id;
            if self.owns_absorbed(id) {
                self.release_absorbed(id);
                let row = &mut self.rows[i];
                row.transformation.channels = row.original.channels;
                continue;
            }
            let width = u32::from(self.rows[i].transformation.channels);
            if width > 1 && self.can_split(i) {
                // donate one split-off channel, keep the rest of the row
                self.split_at(i);
                self.displace_row(i + 1);
                need -= 1;
            } else {
                self.displace_row(i);
                need = need.saturating_sub(width.max(1));
            }
        }
        if need > 0 {
            log::debug!("layout exhausted with {need} channels still to reclaim");
        }
    }

    /// Splice a row out without giving its channel back to anyone.
    /// Split bookkeeping on the parent stays honest and anything the
    /// displaced row still owned is released.
    fn displace_row(&mut self, idx: usize) {
        let removed = self.rows.remove(idx);
        self.snapshots.remove(&removed.id);
        self.release_absorbed(removed.id);
        if let RowRole::SplitChild { parent } = removed.role {
            if let Some(row) = self.row_by_id_mut(parent) {
                row.role = decrement_split(row.role);
            }
        }
        log::debug!("displaced row '{}'", removed.transformation.component);
    }

    /// Follow the owner chain to a row that still holds its own edit.
    fn resolve_owner(&self, start: RowId) -> Option<Track> {
        let mut owner = start;
        for _ in 0..self.rows.len() {
            let row = self.row(owner)?;
            match row.role {
                RowRole::Absorbed { owner: next } => owner = next,
                _ => return Some(row.transformation.clone()),
            }
        }
        None
    }

    fn refresh_snapshots(&mut self) {
        self.snapshots.clear();
        for row in &self.rows {
            self.snapshots.insert(
                row.id,
                RowSnapshot {
                    transformation: row.transformation.clone(),
                    right_greyed: row.right_side_greyed_out(),
                },
            );
        }
    }

    fn check_layout(&self) -> TgResult<()> {
        for row in &self.rows {
            if row.transformation.kind.is_video()
                && (row.transformation.component != row.original.component
                    || row.transformation.channels != row.original.channels
                    || row.transformation.file_position != row.original.file_position)
            {
                return Err(TgError::VideoImmutable);
            }
        }

        let active: Vec<&TrackRow> = self.rows.iter().filter(|r| r.is_parent_row()).collect();
        for row in &active {
            if row.transformation.kind.is_audio() && !row.transformation.channels_in_bounds() {
                return Err(TgError::ChannelCountOutOfRange(row.transformation.channels));
            }
        }
        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                if a.transformation.overlaps(&b.transformation) {
                    return Err(TgError::OverlappingTracks(
                        a.transformation.component.clone(),
                        b.transformation.component.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One split child fewer; back to `Normal` at zero.
fn decrement_split(role: RowRole) -> RowRole {
    match role {
        RowRole::SplitParent { split_count } if split_count > 1 => RowRole::SplitParent {
            split_count: split_count - 1,
        },
        RowRole::SplitParent { .. } => RowRole::Normal,
        other => other,
    }
}
