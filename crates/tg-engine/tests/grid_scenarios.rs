//! Track Grid Scenario Test Suite
//!
//! End-to-end replays of the grid workflows through the public engine
//! surface:
//! - Split of a multi-channel row and its exact inverse via remove
//! - Channel growth absorbing neighbours and the grow/shrink round trip
//! - Audio-type reassignment reclaiming exactly the missing width
//! - Checkbox deselect discarding a pending edit
//! - Id-based parent references surviving drag-reorder
//! - The wire shape the presentation layer reads

use tg_core::{AudioLayout, AudioType, Track};
use tg_engine::{LayoutEngine, RowId, TrackRow};

// ═══════════════════════════════════════════════════════════════════════════════
// TEST FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

fn id_at(engine: &LayoutEngine, idx: usize) -> RowId {
    engine.rows()[idx].id
}

fn positions(engine: &LayoutEngine) -> Vec<u32> {
    engine
        .rows()
        .iter()
        .map(|row| row.transformation.file_position)
        .collect()
}

fn channels(engine: &LayoutEngine) -> Vec<u8> {
    engine
        .rows()
        .iter()
        .map(|row| row.transformation.channels)
        .collect()
}

fn absorbed_ids(engine: &LayoutEngine) -> Vec<RowId> {
    engine
        .rows()
        .iter()
        .filter(|row| row.right_side_greyed_out())
        .map(|row| row.id)
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPLIT / REMOVE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_split_surround_row() {
    let mut engine = LayoutEngine::demo();
    let surround = id_at(&engine, 4);

    engine.split_row(surround);

    // the source drops to 5 channels, which has no audio-type label
    let source = engine.row(surround).unwrap();
    assert_eq!(source.transformation.channels, 5);
    assert_eq!(source.transformation.audio_type, AudioType::Unassigned);
    assert!(source.is_parent_row());

    // a mono child lands immediately after, at position 10 (5 + 5)
    let child = &engine.rows()[5];
    assert_eq!(child.transformation.channels, 1);
    assert_eq!(
        child.transformation.audio_type,
        AudioType::assigned(AudioLayout::Mono, "eng")
    );
    assert!(child.left_side_greyed_out());
    assert_eq!(child.parent_row(), Some(surround));
    assert_eq!(positions(&engine), vec![0, 1, 2, 3, 5, 10]);
    assert!(engine.validate_all());
}

#[test]
fn test_split_then_remove_is_inverse() {
    let mut engine = LayoutEngine::demo();
    let surround = id_at(&engine, 4);

    engine.split_row(surround);
    let child = engine.rows()[5].id;
    engine.remove_row(child);

    // channel count and position layout are back to the pre-split state
    assert_eq!(engine.rows().len(), 5);
    assert_eq!(channels(&engine), vec![1, 1, 1, 2, 6]);
    assert_eq!(positions(&engine), vec![0, 1, 2, 3, 5]);
    assert!(engine.row(child).is_none());
    assert!(engine.row(surround).unwrap().is_parent_row());
}

#[test]
fn test_remove_after_reorder_still_finds_parent() {
    let mut engine = LayoutEngine::demo();
    let surround = id_at(&engine, 4);

    engine.split_row(surround);
    let child = engine.rows()[5].id;

    // drag the child up between Mono_1 and Mono_2
    engine.reorder(5, 2);
    assert_eq!(engine.rows()[2].id, child);

    // the parent reference is by id, so removal still reverses the split
    engine.remove_row(child);
    assert_eq!(engine.row(surround).unwrap().transformation.channels, 6);
    assert_eq!(positions(&engine), vec![0, 1, 2, 3, 5]);
    assert!(engine.validate_all());
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHANNEL GROWTH AND SHRINK
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_grow_mono_absorbs_two_rows() {
    let mut engine = LayoutEngine::demo();
    let video = id_at(&engine, 0);
    let mono1 = id_at(&engine, 1);
    let video_baseline = engine.rows()[0].clone();

    engine.change_channel_count(mono1, 3);

    // Mono_2 and the stereo row's standalone remainder are absorbed; the
    // stereo row's spare channel survives as a split child
    let absorbed = absorbed_ids(&engine);
    assert_eq!(absorbed.len(), 2);
    let owner = engine.row(mono1).unwrap().transformation.clone();
    for id in &absorbed {
        let row = engine.row(*id).unwrap();
        assert_eq!(row.transformation, owner);
        assert!(!row.is_parent_row());
    }
    assert!(engine
        .rows()
        .iter()
        .any(|row| row.left_side_greyed_out() && row.transformation.channels == 1));

    // the scan never touches the video row
    let video_row = engine.row(video).unwrap();
    assert_eq!(video_row.original, video_baseline.original);
    assert_eq!(video_row.transformation, video_baseline.transformation);
    assert!(engine.validate_all());
}

#[test]
fn test_grow_then_shrink_round_trip() {
    let mut engine = LayoutEngine::demo();
    let mono1 = id_at(&engine, 1);

    engine.change_channel_count(mono1, 3);
    engine.change_channel_count(mono1, 1);

    // every displaced row holds its own state again
    assert!(absorbed_ids(&engine).is_empty());
    for row in engine.rows() {
        assert_eq!(row.transformation, row.original);
    }
    assert!(engine.changed_rows().is_empty());
    assert!(engine.validate_all());
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO-TYPE REASSIGNMENT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_surround_retype_reclaims_exactly_five_channels() {
    // the three rows after "A" hold less than 5 spare channels between
    // them, so the surround row at the end must donate the rest
    let mut engine = LayoutEngine::new(vec![
        Track::video("Video_1"),
        Track::audio("A", 1, AudioType::assigned(AudioLayout::Mono, "fra")),
        Track::audio("B", 1, AudioType::assigned(AudioLayout::Mono, "fra")),
        Track::audio("C", 1, AudioType::assigned(AudioLayout::Mono, "eng")),
        Track::audio("D", 2, AudioType::assigned(AudioLayout::Stereo, "eng")),
        Track::audio("E", 6, AudioType::assigned(AudioLayout::Surround, "eng")),
    ]);
    let a = id_at(&engine, 1);

    engine.change_audio_type(a, AudioType::assigned(AudioLayout::Surround, "fra"));

    // B, C and all of D are displaced; E donates exactly one channel
    assert_eq!(engine.rows().len(), 3);
    let row = engine.row(a).unwrap();
    assert_eq!(row.transformation.channels, 6);
    assert_eq!(
        row.transformation.audio_type,
        AudioType::assigned(AudioLayout::Surround, "fra")
    );
    assert_eq!(row.transformation.component, "surround-fra");

    let tail = &engine.rows()[2];
    assert_eq!(tail.transformation.channels, 5);
    assert_eq!(tail.transformation.audio_type, AudioType::Unassigned);

    // total occupied width is unchanged: 1 + 6 + 5
    assert_eq!(positions(&engine), vec![0, 1, 7]);
    assert!(engine.validate_all());
}

#[test]
fn test_retype_to_narrower_layout_displaces_nothing() {
    let mut engine = LayoutEngine::demo();
    let stereo = id_at(&engine, 3);

    engine.change_audio_type(stereo, AudioType::assigned(AudioLayout::Mono, "eng"));

    assert_eq!(engine.rows().len(), 5);
    let row = engine.row(stereo).unwrap();
    assert_eq!(row.transformation.channels, 1);
    assert_eq!(row.transformation.component, "mono-eng");
    assert_eq!(positions(&engine), vec![0, 1, 2, 3, 4]);
    assert!(engine.validate_all());
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTION AND ADDED ROWS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_deselect_discards_pending_edit() {
    let mut engine = LayoutEngine::demo();
    let mono1 = id_at(&engine, 1);

    engine.toggle_select(mono1);
    assert!(engine.row(mono1).unwrap().selected);

    engine.change_channel_count(mono1, 3);
    assert_eq!(absorbed_ids(&engine).len(), 2);

    // unticking the row releases everything it absorbed and resets it
    engine.toggle_select(mono1);
    assert!(!engine.row(mono1).unwrap().selected);
    assert!(absorbed_ids(&engine).is_empty());
    for row in engine.rows() {
        assert_eq!(row.transformation, row.original);
    }
}

#[test]
fn test_add_row_appends_at_end_of_layout() {
    let mut engine = LayoutEngine::demo();
    engine.add_row();

    let added = engine.rows().last().unwrap();
    assert_eq!(added.transformation.component, "Track 1");
    assert_eq!(added.transformation.channels, 1);
    assert_eq!(added.transformation.audio_type, AudioType::Unassigned);
    assert_eq!(added.transformation.file_position, 11);
    assert!(added.selected);
    assert!(engine.validate_all());
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMIT / ROLLBACK
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_rollback_returns_to_last_commit() {
    let mut engine = LayoutEngine::demo();
    engine.split_row(id_at(&engine, 4));
    engine.commit();
    let committed: Vec<TrackRow> = engine.rows().to_vec();

    engine.change_channel_count(id_at(&engine, 1), 4);
    engine.add_row();
    assert_ne!(engine.rows(), &committed[..]);

    engine.rollback();
    assert_eq!(engine.rows(), &committed[..]);
    assert!(engine.changed_rows().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_render_projection_wire_shape() {
    let mut engine = LayoutEngine::demo();
    let mono1 = id_at(&engine, 1);
    engine.change_channel_count(mono1, 2);

    let json = serde_json::to_value(engine.render()).unwrap();
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 5);

    // the grid reads the legacy flag names and camelCase track fields
    assert_eq!(rows[0]["isParentRow"], true);
    assert_eq!(rows[0]["transformation"]["filePosition"], 0);
    assert_eq!(rows[1]["rightSideGreyedOut"], false);
    assert_eq!(rows[2]["rightSideGreyedOut"], true);
    assert_eq!(rows[2]["leftSideGreyedOut"], false);
    assert!(rows[2].get("parentRow").is_some());
    assert_eq!(rows[2]["transformation"]["channels"], 2);
}
