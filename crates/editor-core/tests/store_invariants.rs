//! Property tests: the store's structural invariants survive arbitrary
//! operation sequences, and undo always restores the prior state.

use proptest::prelude::*;

use cutline_editor_core::{EditorStore, HISTORY_CAP};
use cutline_project_model::{ClipDescriptor, TrackId};

/// A randomly generated store operation. Indices and times are drawn wide
/// on purpose so both accepted and rejected paths are exercised.
#[derive(Debug, Clone)]
enum Op {
    Add { count: usize, track: u32 },
    Trim { nth: usize, start: f64, end: f64 },
    Split { nth: usize, at: f64 },
    Reorder { from: usize, to: usize, track: u32 },
    Delete { nth: usize },
    Move { nth: usize, track: u32 },
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..4, 0u32..6).prop_map(|(count, track)| Op::Add { count, track }),
        (0usize..12, -2.0f64..12.0, -2.0f64..12.0)
            .prop_map(|(nth, start, end)| Op::Trim { nth, start, end }),
        (0usize..12, -2.0f64..12.0).prop_map(|(nth, at)| Op::Split { nth, at }),
        (0usize..12, 0usize..12, 0u32..6)
            .prop_map(|(from, to, track)| Op::Reorder { from, to, track }),
        (0usize..12).prop_map(|nth| Op::Delete { nth }),
        (0usize..12, 0u32..6).prop_map(|(nth, track)| Op::Move { nth, track }),
        Just(Op::Undo),
        Just(Op::Redo),
    ]
}

/// Pick the nth clip id across all tracks, wrapping on overflow.
fn nth_clip(store: &EditorStore, nth: usize) -> Option<cutline_project_model::ClipId> {
    let ids: Vec<_> = store
        .tracks()
        .iter()
        .flat_map(|t| t.clips.iter().map(|c| c.id))
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[nth % ids.len()])
    }
}

fn apply(store: &mut EditorStore, op: &Op) {
    match op {
        Op::Add { count, track } => {
            let descriptors = (0..*count)
                .map(|i| ClipDescriptor::from_source(format!("sources/{i}.mp4"), 10.0))
                .collect();
            let _ = store.add_clips(descriptors, TrackId(*track));
        }
        Op::Trim { nth, start, end } => {
            if let Some(id) = nth_clip(store, *nth) {
                let _ = store.set_trim(id, *start, *end);
            }
        }
        Op::Split { nth, at } => {
            if let Some(id) = nth_clip(store, *nth) {
                let _ = store.split_clip(id, *at);
            }
        }
        Op::Reorder { from, to, track } => {
            let _ = store.reorder_clips(*from, *to, TrackId(*track));
        }
        Op::Delete { nth } => {
            if let Some(id) = nth_clip(store, *nth) {
                let _ = store.delete_clip(id);
            }
        }
        Op::Move { nth, track } => {
            if let Some(id) = nth_clip(store, *nth) {
                let _ = store.move_clip_to_track(id, TrackId(*track));
            }
        }
        Op::Undo => {
            store.undo();
        }
        Op::Redo => {
            store.redo();
        }
    }
}

fn assert_structurally_valid(store: &EditorStore) {
    for track in store.tracks() {
        assert!(
            track.orders_are_dense(),
            "track {} orders not dense",
            track.id
        );
        for clip in &track.clips {
            assert!(
                clip.trim_is_valid(),
                "clip {} trim invariant violated: start={} end={} duration={}",
                clip.id,
                clip.start,
                clip.end,
                clip.duration
            );
            assert_eq!(clip.track, track.id, "clip {} track field stale", clip.id);
        }
    }
    if let Some(selected) = store.selected() {
        assert!(
            store.clip(selected).is_some(),
            "selection references destroyed clip"
        );
    }
}

proptest! {
    #[test]
    fn invariants_hold_under_arbitrary_operations(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut store = EditorStore::new();
        for op in &ops {
            apply(&mut store, op);
            assert_structurally_valid(&store);
            prop_assert!(store.history_len() <= HISTORY_CAP);
        }
    }

    #[test]
    fn undo_restores_the_previous_state(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut store = EditorStore::new();
        for op in &ops {
            // Undo/redo themselves are exempt: they move through history
            // rather than creating it.
            if matches!(op, Op::Undo | Op::Redo) {
                apply(&mut store, op);
                continue;
            }

            let before = store.snapshot();
            apply(&mut store, op);

            // Any operation that changed the state must be reversible by a
            // single undo, and redo must return to the mutated state.
            if store.snapshot() != before {
                let mutated = store.snapshot();
                prop_assert!(store.undo());
                prop_assert_eq!(store.snapshot(), before);
                prop_assert!(store.redo());
                prop_assert_eq!(store.snapshot(), mutated);
            }
        }
    }
}
