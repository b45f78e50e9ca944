//! Property-based invariant tests for the flattened gallery layout.
//!
//! 1. Every separator starts a row.
//! 2. Flat indices are exactly `0..N`.
//! 3. Scroll offset -> month -> scroll offset round trips for every month.
//! 4. In synchronized view both panes place every month at the same index.
//! 5. Restoring the same month twice lands on the same offset as once.
//! 6. Month navigation visits every month exactly once.

use std::collections::BTreeMap;
use std::time::Instant;

use monthgrid::layout::{build_layout, GalleryLayout, SyncMode};
use monthgrid::models::{DateBucketMap, GallerySlot, YearMonth};
use monthgrid::position::{next_month, MonthResolver, RestorationController, RestoreTrigger};
use monthgrid::ui::{FixedCellGrid, GridGeometry, GridWidget};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn date_strategy() -> impl Strategy<Value = String> {
    (2018i32..=2024, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

/// Date keys mapped to a number of ids; ids are numbered globally so they
/// are unique and carry a group key.
fn bucket_strategy() -> impl Strategy<Value = DateBucketMap> {
    prop::collection::btree_map(date_strategy(), 0usize..7, 0..16).prop_map(numbered)
}

fn numbered(sizes: BTreeMap<String, usize>) -> DateBucketMap {
    let mut next = 0u64;
    sizes
        .into_iter()
        .map(|(date, count)| {
            let ids: Vec<String> = (0..count)
                .map(|_| {
                    next += 1;
                    format!("img_{next}")
                })
                .collect();
            (date, ids)
        })
        .collect()
}

/// Two panes drawn from one numbered collection: every id goes to the
/// source, the destination, or both, always under the same date.
fn pane_pair_strategy() -> impl Strategy<Value = (DateBucketMap, DateBucketMap)> {
    (bucket_strategy(), any::<u64>()).prop_map(|(all, seed)| {
        let mut source = DateBucketMap::new();
        let mut destination = DateBucketMap::new();
        let mut bits = seed;
        for (date, ids) in all {
            for id in ids {
                match bits % 3 {
                    0 => source.entry(date.clone()).or_default().push(id),
                    1 => destination.entry(date.clone()).or_default().push(id),
                    _ => {
                        source.entry(date.clone()).or_default().push(id.clone());
                        destination.entry(date.clone()).or_default().push(id);
                    }
                }
                bits = bits.rotate_left(7) ^ 0x9e37_79b9;
            }
            source.entry(date.clone()).or_default();
            destination.entry(date).or_default();
        }
        (source, destination)
    })
}

fn grid_for(layout: &GalleryLayout, row_height: f64) -> FixedCellGrid {
    let mut grid = FixedCellGrid::new(
        1,
        GridGeometry::new(layout.columns as f64 * row_height, 0.0, row_height, layout.columns),
    );
    grid.set_row_count(layout.row_count());
    grid
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Row alignment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn separators_start_rows(buckets in bucket_strategy(), columns in 1usize..9) {
        let layout = build_layout(&buckets, columns, SyncMode::Off);
        for slot in &layout.slots {
            if let GallerySlot::Separator { flat_index, .. } = slot {
                prop_assert_eq!(flat_index % columns, 0, "separator at {} with {} columns", flat_index, columns);
            }
        }
        for sep in layout.index.separator_positions() {
            prop_assert_eq!(sep.flat_index % columns, 0);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Monotonic contiguous indices
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flat_indices_are_contiguous(buckets in bucket_strategy(), columns in 1usize..9) {
        let layout = build_layout(&buckets, columns, SyncMode::Off);
        for (i, slot) in layout.slots.iter().enumerate() {
            prop_assert_eq!(slot.flat_index(), i);
        }
        let media: usize = buckets.values().map(Vec::len).sum();
        prop_assert_eq!(layout.media_count(), media);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Resolver round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn resolver_round_trip(
        buckets in bucket_strategy(),
        columns in 1usize..9,
        row_height in 10.0f64..400.0,
    ) {
        let layout = build_layout(&buckets, columns, SyncMode::Off);
        let resolver = MonthResolver::default();
        for month in layout.index.months_descending() {
            let row = resolver.month_to_scroll_target(&layout.index, month, columns).unwrap();
            let resolved = resolver.scroll_top_to_month(
                row as f64 * row_height,
                row_height,
                columns,
                layout.index.separator_positions(),
            );
            prop_assert_eq!(resolved, Some(month));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Union alignment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn union_layouts_align((source, destination) in pane_pair_strategy(), columns in 1usize..9) {
        let left = build_layout(&source, columns, SyncMode::Union(&destination));
        let right = build_layout(&destination, columns, SyncMode::Union(&source));

        prop_assert_eq!(left.index.separator_positions(), right.index.separator_positions());
        prop_assert_eq!(left.len(), right.len());

        for (a, b) in left.slots.iter().zip(&right.slots) {
            prop_assert_eq!(slot_id(a), slot_id(b));
            let both_missing = matches!(a, GallerySlot::Missing { .. })
                && matches!(b, GallerySlot::Missing { .. });
            prop_assert!(!both_missing, "{:?} is missing on both sides", a);
        }
    }
}

/// Id carried by a media or missing slot.
fn slot_id(slot: &GallerySlot) -> Option<&str> {
    match slot {
        GallerySlot::Media { id, .. } | GallerySlot::Missing { id, .. } => Some(id.as_str()),
        _ => None,
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Restoration idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn restoration_idempotent(
        buckets in bucket_strategy(),
        columns in 1usize..9,
        pick in any::<prop::sample::Index>(),
    ) {
        let layout = build_layout(&buckets, columns, SyncMode::Off);
        let months = layout.index.months_descending();
        prop_assume!(!months.is_empty());
        let target = months[pick.index(months.len())];

        let now = Instant::now();
        let mut once = grid_for(&layout, 100.0);
        let mut twice = grid_for(&layout, 100.0);
        let mut first = RestorationController::default();
        let mut second = RestorationController::default();

        first.begin(RestoreTrigger::Jump(target), now, Some(&mut once), &layout).unwrap();
        second.begin(RestoreTrigger::Jump(target), now, Some(&mut twice), &layout).unwrap();
        second.begin(RestoreTrigger::Remounted, now, Some(&mut twice), &layout).unwrap();

        prop_assert_eq!(once.scroll_top(), twice.scroll_top());
        prop_assert_eq!(first.current_year_month(), second.current_year_month());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Navigation covers every month
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn next_month_walks_all_months(buckets in bucket_strategy()) {
        let layout = build_layout(&buckets, 3, SyncMode::Off);
        let mut visited: Vec<YearMonth> = Vec::new();
        let mut current = None;
        while let Some(month) = next_month(&layout.index, current) {
            visited.push(month);
            current = Some(month);
        }
        prop_assert_eq!(visited, layout.index.months_descending());
    }
}
