use std::collections::{BTreeMap, HashMap};

use crate::models::{GallerySlot, MediaId, YearMonth};

/// Flat index of one month separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparatorPosition {
    pub flat_index: usize,
    pub year_month: YearMonth,
}

/// Month lookup tables derived from one flattened gallery.
///
/// Built once by the layout builder and never mutated afterwards; a change of
/// input produces a new index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateIndex {
    pub(crate) id_to_date: HashMap<MediaId, String>,
    pub(crate) year_month_to_flat_index: HashMap<YearMonth, usize>,
    /// Distinct years, newest first.
    pub(crate) years: Vec<i32>,
    /// Year to distinct months, each list ascending.
    pub(crate) months_by_year: BTreeMap<i32, Vec<u32>>,
    /// Ascending by flat index, which is also newest month first.
    pub(crate) separator_positions: Vec<SeparatorPosition>,
}

impl DateIndex {
    /// Date bucket key of a media id this pane owns.
    pub fn date_of(&self, id: &str) -> Option<&str> {
        self.id_to_date.get(id).map(String::as_str)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.id_to_date.contains_key(id)
    }

    /// Month of a media id this pane owns.
    pub fn year_month_of(&self, id: &str) -> Option<YearMonth> {
        self.date_of(id).and_then(YearMonth::from_date_key)
    }

    /// Flat index of the month's separator.
    pub fn flat_index_of(&self, ym: YearMonth) -> Option<usize> {
        self.year_month_to_flat_index.get(&ym).copied()
    }

    pub fn contains_month(&self, ym: YearMonth) -> bool {
        self.year_month_to_flat_index.contains_key(&ym)
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn months_of(&self, year: i32) -> &[u32] {
        self.months_by_year
            .get(&year)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn months_by_year(&self) -> &BTreeMap<i32, Vec<u32>> {
        &self.months_by_year
    }

    pub fn separator_positions(&self) -> &[SeparatorPosition] {
        &self.separator_positions
    }

    /// All indexed months, newest first.
    pub fn months_descending(&self) -> Vec<YearMonth> {
        let mut months: Vec<YearMonth> = self.year_month_to_flat_index.keys().copied().collect();
        months.sort_unstable_by(|a, b| b.cmp(a));
        months
    }

    pub fn month_count(&self) -> usize {
        self.year_month_to_flat_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.year_month_to_flat_index.is_empty()
    }
}

/// A flattened gallery: the slot sequence plus its month index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryLayout {
    pub slots: Vec<GallerySlot>,
    pub index: DateIndex,
    /// Column count the slots were aligned for.
    pub columns: usize,
}

impl GalleryLayout {
    pub fn empty(columns: usize) -> Self {
        Self {
            slots: Vec::new(),
            index: DateIndex::default(),
            columns: columns.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of grid rows needed to show every slot.
    pub fn row_count(&self) -> usize {
        self.slots.len().div_ceil(self.columns)
    }

    /// Cell lookup for the virtualized grid. Cells past the end of the last
    /// row return `None`.
    pub fn slot_at(&self, row: usize, col: usize) -> Option<&GallerySlot> {
        if col >= self.columns {
            return None;
        }
        self.slots.get(row * self.columns + col)
    }

    /// Row holding the given flat index.
    pub fn row_of(&self, flat_index: usize) -> usize {
        flat_index / self.columns
    }

    /// Number of slots that are real media.
    pub fn media_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_selectable()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_empty_index() {
        let index = DateIndex::default();
        assert!(index.is_empty());
        assert!(index.years().is_empty());
        assert!(index.months_of(2024).is_empty());
        assert!(index.months_descending().is_empty());
        assert_eq!(index.flat_index_of(ym(2024, 1)), None);
    }

    #[test]
    fn test_months_descending() {
        let mut index = DateIndex::default();
        index.year_month_to_flat_index.insert(ym(2023, 12), 4);
        index.year_month_to_flat_index.insert(ym(2024, 2), 0);
        index.year_month_to_flat_index.insert(ym(2024, 1), 2);

        assert_eq!(
            index.months_descending(),
            vec![ym(2024, 2), ym(2024, 1), ym(2023, 12)]
        );
        assert_eq!(index.month_count(), 3);
    }

    #[test]
    fn test_slot_at() {
        let layout = GalleryLayout {
            slots: (0..5)
                .map(|i| GallerySlot::Padding { flat_index: i })
                .collect(),
            index: DateIndex::default(),
            columns: 2,
        };
        assert_eq!(layout.row_count(), 3);
        assert_eq!(layout.slot_at(1, 1).map(GallerySlot::flat_index), Some(3));
        assert_eq!(layout.slot_at(2, 0).map(GallerySlot::flat_index), Some(4));
        assert!(layout.slot_at(2, 1).is_none());
        assert!(layout.slot_at(0, 2).is_none());
        assert_eq!(layout.row_of(3), 1);
    }

    #[test]
    fn test_empty_layout_clamps_columns() {
        let layout = GalleryLayout::empty(0);
        assert_eq!(layout.columns, 1);
        assert_eq!(layout.row_count(), 0);
        assert!(layout.slot_at(0, 0).is_none());
    }
}
