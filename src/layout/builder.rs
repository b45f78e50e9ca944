use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::date_index::{DateIndex, GalleryLayout, SeparatorPosition};
use crate::models::{
    alignment_order, parse_date_key, DateBucketMap, EnglishLabeler, GallerySlot, MediaId,
    MonthLabeler, YearMonth,
};

/// Whether a pane is flattened on its own or against the union with its
/// counterpart in synchronized view.
#[derive(Debug, Clone, Copy)]
pub enum SyncMode<'a> {
    Off,
    /// Lay out the union of this pane's buckets and the other pane's buckets.
    Union(&'a DateBucketMap),
}

impl SyncMode<'_> {
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Union(_))
    }
}

/// Flattens date buckets into a row-aligned slot sequence.
///
/// # Algorithm
/// 1. Drop bucket keys that are not strict `YYYY-MM-DD` dates.
/// 2. In synchronized view, union the dates of both panes and, per date, the
///    ids of both panes, ordered by their cross-pane group key.
/// 3. Walk dates newest first. At each month boundary pad with `Padding`
///    until the sequence length is a multiple of the column count, then emit
///    one `Separator`.
/// 4. Emit one slot per id: `Media` when this pane owns the id on that date,
///    `Missing` otherwise (synchronized view only).
///
/// The month index is accumulated during the same walk.
#[derive(Clone)]
pub struct LayoutBuilder {
    labeler: Arc<dyn MonthLabeler + Send + Sync>,
}

impl fmt::Debug for LayoutBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutBuilder")
            .field("labeler", &"<labeler>")
            .finish()
    }
}

impl Default for LayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self {
            labeler: Arc::new(EnglishLabeler),
        }
    }

    /// Uses a custom labeler for separator labels.
    pub fn with_labeler<L>(labeler: L) -> Self
    where
        L: MonthLabeler + Send + Sync + 'static,
    {
        Self {
            labeler: Arc::new(labeler),
        }
    }

    pub fn label(&self, ym: YearMonth) -> String {
        self.labeler.label(ym)
    }

    /// Builds the slot sequence and month index.
    ///
    /// A column count of zero is treated as one. Never fails: malformed date
    /// keys are skipped and an empty map yields an empty layout.
    pub fn build(&self, buckets: &DateBucketMap, columns: usize, sync: SyncMode<'_>) -> GalleryLayout {
        let columns = columns.max(1);
        let owned = owned_dates(buckets);

        let dated = match sync {
            SyncMode::Off => own_buckets(buckets),
            SyncMode::Union(other) => union_buckets(buckets, other),
        };

        let mut slots: Vec<GallerySlot> = Vec::with_capacity(
            dated.iter().map(|(_, ids)| ids.len()).sum::<usize>() + dated.len() * columns,
        );
        let mut year_month_to_flat_index = HashMap::new();
        let mut separator_positions = Vec::new();
        let mut months_by_year: BTreeMap<i32, BTreeSet<u32>> = BTreeMap::new();
        let mut current_month: Option<YearMonth> = None;

        for (date_key, ids) in &dated {
            let Some(ym) = YearMonth::from_date_key(date_key) else {
                continue;
            };

            if current_month != Some(ym) {
                while slots.len() % columns != 0 {
                    slots.push(GallerySlot::Padding {
                        flat_index: slots.len(),
                    });
                }
                let flat_index = slots.len();
                slots.push(GallerySlot::Separator {
                    year_month: ym,
                    label: self.labeler.label(ym),
                    flat_index,
                });
                year_month_to_flat_index.entry(ym).or_insert(flat_index);
                separator_positions.push(SeparatorPosition {
                    flat_index,
                    year_month: ym,
                });
                months_by_year.entry(ym.year).or_default().insert(ym.month);
                current_month = Some(ym);
            }

            for id in ids {
                let flat_index = slots.len();
                let is_own = match sync {
                    SyncMode::Off => true,
                    SyncMode::Union(_) => owned.get(id.as_str()).copied() == Some(date_key),
                };
                if is_own {
                    slots.push(GallerySlot::Media {
                        id: id.clone(),
                        flat_index,
                    });
                } else {
                    slots.push(GallerySlot::Missing {
                        id: id.clone(),
                        flat_index,
                    });
                }
            }
        }

        let id_to_date: HashMap<MediaId, String> = owned
            .into_iter()
            .map(|(id, date)| (id.to_string(), date.clone()))
            .collect();

        let years: Vec<i32> = months_by_year.keys().rev().copied().collect();
        let months_by_year = months_by_year
            .into_iter()
            .map(|(year, months)| (year, months.into_iter().collect()))
            .collect();

        debug!(
            slots = slots.len(),
            months = separator_positions.len(),
            columns,
            synced = sync.is_synced(),
            "Built gallery layout"
        );

        GalleryLayout {
            slots,
            index: DateIndex {
                id_to_date,
                year_month_to_flat_index,
                years,
                months_by_year,
                separator_positions,
            },
            columns,
        }
    }
}

/// Builds a layout with the default English labels.
pub fn build_layout(buckets: &DateBucketMap, columns: usize, sync: SyncMode<'_>) -> GalleryLayout {
    LayoutBuilder::new().build(buckets, columns, sync)
}

/// Id to date key for every id this pane owns under a valid date.
fn owned_dates(buckets: &DateBucketMap) -> HashMap<&str, &String> {
    let mut owned = HashMap::with_capacity(buckets.values().map(Vec::len).sum());
    for (date_key, ids) in buckets {
        if parse_date_key(date_key).is_none() {
            continue;
        }
        for id in ids {
            owned.insert(id.as_str(), date_key);
        }
    }
    owned
}

/// This pane's valid buckets, newest date first, ids in insertion order.
fn own_buckets(buckets: &DateBucketMap) -> Vec<(String, Vec<MediaId>)> {
    let mut dated: Vec<(String, Vec<MediaId>)> = buckets
        .iter()
        .filter(|(date_key, _)| valid_key(date_key))
        .map(|(date_key, ids)| (date_key.clone(), ids.clone()))
        .collect();
    dated.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    dated
}

/// Union of both panes' valid buckets, newest date first, ids deduplicated
/// and ordered by group key so both panes produce the same sequence.
fn union_buckets(buckets: &DateBucketMap, other: &DateBucketMap) -> Vec<(String, Vec<MediaId>)> {
    let mut merged: BTreeMap<&str, Vec<&MediaId>> = BTreeMap::new();
    for (date_key, ids) in buckets.iter().chain(other.iter()) {
        if !valid_key(date_key) {
            continue;
        }
        merged.entry(date_key.as_str()).or_default().extend(ids.iter());
    }

    merged
        .into_iter()
        .rev()
        .map(|(date_key, ids)| {
            let mut seen = HashSet::with_capacity(ids.len());
            let mut ids: Vec<MediaId> = ids
                .into_iter()
                .filter(|id| seen.insert(*id))
                .cloned()
                .collect();
            ids.sort_by(|a, b| alignment_order(a, b));
            (date_key.to_string(), ids)
        })
        .collect()
}

fn valid_key(date_key: &str) -> bool {
    let valid = parse_date_key(date_key).is_some();
    if !valid {
        debug!(date_key, "Skipping malformed date bucket");
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(entries: &[(&str, &[&str])]) -> DateBucketMap {
        entries
            .iter()
            .map(|(date, ids)| (date.to_string(), ids.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    fn describe(layout: &GalleryLayout) -> Vec<String> {
        layout
            .slots
            .iter()
            .map(|slot| match slot {
                GallerySlot::Media { id, .. } => id.clone(),
                GallerySlot::Separator { year_month, .. } => format!("#{}", year_month),
                GallerySlot::Padding { .. } => "_".to_string(),
                GallerySlot::Missing { id, .. } => format!("?{}", id),
            })
            .collect()
    }

    #[test]
    fn test_empty_buckets() {
        let layout = build_layout(&DateBucketMap::new(), 4, SyncMode::Off);
        assert!(layout.is_empty());
        assert!(layout.index.is_empty());
        assert!(layout.index.years().is_empty());
        assert!(layout.index.separator_positions().is_empty());
    }

    #[test]
    fn test_two_month_example() {
        let map = buckets(&[
            ("2024-03-01", &["a", "b"]),
            ("2024-03-02", &["c"]),
            ("2024-02-15", &["d"]),
        ]);
        let layout = build_layout(&map, 2, SyncMode::Off);

        assert_eq!(describe(&layout), vec!["#2024-03", "c", "a", "b", "#2024-02", "d"]);
        assert_eq!(layout.index.flat_index_of(ym(2024, 3)), Some(0));
        assert_eq!(layout.index.flat_index_of(ym(2024, 2)), Some(4));
        assert_eq!(layout.index.date_of("a"), Some("2024-03-01"));
        assert_eq!(layout.index.date_of("d"), Some("2024-02-15"));
    }

    #[test]
    fn test_padding_before_separator() {
        let map = buckets(&[("2024-03-01", &["a", "b", "c"]), ("2024-02-01", &["d"])]);
        let layout = build_layout(&map, 3, SyncMode::Off);

        // 4 slots in March, padded to 6 before the February separator.
        assert_eq!(
            describe(&layout),
            vec!["#2024-03", "a", "b", "c", "_", "_", "#2024-02", "d"]
        );
        assert_eq!(layout.index.flat_index_of(ym(2024, 2)), Some(6));
    }

    #[test]
    fn test_separators_row_aligned_and_indices_contiguous() {
        let map = buckets(&[
            ("2024-05-03", &["a", "b", "c", "d", "e"]),
            ("2024-04-20", &["f"]),
            ("2023-12-31", &["g", "h"]),
            ("2023-01-01", &["i", "j", "k"]),
        ]);
        for columns in 1..=7 {
            let layout = build_layout(&map, columns, SyncMode::Off);
            for (i, slot) in layout.slots.iter().enumerate() {
                assert_eq!(slot.flat_index(), i);
                if slot.is_separator() {
                    assert_eq!(i % columns, 0, "columns={columns}");
                }
            }
        }
    }

    #[test]
    fn test_same_month_dates_share_one_separator() {
        let map = buckets(&[("2024-03-31", &["a"]), ("2024-03-01", &["b"])]);
        let layout = build_layout(&map, 4, SyncMode::Off);
        assert_eq!(describe(&layout), vec!["#2024-03", "a", "b"]);
        assert_eq!(layout.index.separator_positions().len(), 1);
    }

    #[test]
    fn test_empty_date_still_emits_separator() {
        let map = buckets(&[("2024-03-01", &["a"]), ("2024-01-10", &[])]);
        let layout = build_layout(&map, 2, SyncMode::Off);
        assert_eq!(describe(&layout), vec!["#2024-03", "a", "#2024-01"]);
        assert!(layout.index.contains_month(ym(2024, 1)));
    }

    #[test]
    fn test_malformed_dates_skipped() {
        let map = buckets(&[
            ("2024-03-01", &["a"]),
            ("garbage", &["x"]),
            ("2024-13-01", &["y"]),
            ("2024-3-1", &["z"]),
        ]);
        let layout = build_layout(&map, 2, SyncMode::Off);
        assert_eq!(describe(&layout), vec!["#2024-03", "a"]);
        assert!(!layout.index.contains_id("x"));
        assert!(!layout.index.contains_id("z"));
    }

    #[test]
    fn test_years_and_months() {
        let map = buckets(&[
            ("2024-03-01", &["a"]),
            ("2023-11-01", &["b"]),
            ("2024-01-05", &["c"]),
            ("2023-02-01", &["d"]),
        ]);
        let layout = build_layout(&map, 3, SyncMode::Off);
        assert_eq!(layout.index.years(), &[2024, 2023]);
        assert_eq!(layout.index.months_of(2024), &[1, 3]);
        assert_eq!(layout.index.months_of(2023), &[2, 11]);

        let positions: Vec<usize> = layout
            .index
            .separator_positions()
            .iter()
            .map(|p| p.flat_index)
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_separator_labels() {
        let map = buckets(&[("2024-03-01", &["a"])]);
        let layout = build_layout(&map, 2, SyncMode::Off);
        match &layout.slots[0] {
            GallerySlot::Separator { label, .. } => assert_eq!(label, "March 2024"),
            other => panic!("expected separator, got {other:?}"),
        }

        let builder = LayoutBuilder::with_labeler(|ym: YearMonth| format!("{}.{}", ym.month, ym.year));
        let layout = builder.build(&map, 2, SyncMode::Off);
        match &layout.slots[0] {
            GallerySlot::Separator { label, .. } => assert_eq!(label, "3.2024"),
            other => panic!("expected separator, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_columns_treated_as_one() {
        let map = buckets(&[("2024-03-01", &["a"]), ("2024-02-01", &["b"])]);
        let layout = build_layout(&map, 0, SyncMode::Off);
        assert_eq!(layout.columns, 1);
        assert_eq!(describe(&layout), vec!["#2024-03", "a", "#2024-02", "b"]);
    }

    #[test]
    fn test_sync_mode_marks_missing() {
        let source = buckets(&[("2024-03-01", &["src-1", "src-2"])]);
        let dest = buckets(&[("2024-03-01", &["dst-2"]), ("2024-02-01", &["dst-9"])]);

        let src_layout = build_layout(&source, 2, SyncMode::Union(&dest));
        assert_eq!(
            describe(&src_layout),
            vec!["#2024-03", "src-1", "?dst-2", "src-2", "#2024-02", "?dst-9"]
        );
        // Missing ids never enter this pane's id index.
        assert!(!src_layout.index.contains_id("dst-2"));
        assert!(src_layout.index.contains_month(ym(2024, 2)));

        let dst_layout = build_layout(&dest, 2, SyncMode::Union(&source));
        assert_eq!(
            describe(&dst_layout),
            vec!["#2024-03", "?src-1", "dst-2", "?src-2", "#2024-02", "dst-9"]
        );
    }

    #[test]
    fn test_sync_mode_separators_align() {
        let source = buckets(&[
            ("2024-03-01", &["src-1", "src-2", "src-3"]),
            ("2024-01-01", &["src-4"]),
        ]);
        let dest = buckets(&[("2024-02-01", &["dst-5"]), ("2024-01-01", &["dst-4", "dst-6"])]);

        let a = build_layout(&source, 3, SyncMode::Union(&dest));
        let b = build_layout(&dest, 3, SyncMode::Union(&source));
        assert_eq!(a.len(), b.len());
        assert_eq!(a.index.separator_positions(), b.index.separator_positions());
    }

    #[test]
    fn test_sync_mode_dedups_shared_ids() {
        let source = buckets(&[("2024-03-01", &["7", "3"])]);
        let dest = buckets(&[("2024-03-01", &["3"])]);
        let layout = build_layout(&source, 4, SyncMode::Union(&dest));
        assert_eq!(describe(&layout), vec!["#2024-03", "3", "7"]);

        let dest_layout = build_layout(&dest, 4, SyncMode::Union(&source));
        assert_eq!(describe(&dest_layout), vec!["#2024-03", "3", "?7"]);
    }
}
