use tracing::trace;

use crate::config::ResolverConfig;
use crate::error::GridError;
use crate::layout::{DateIndex, GalleryLayout, SeparatorPosition};
use crate::models::YearMonth;
use crate::ui::widget::{Align, GridWidget};

/// Maps between scroll offsets and calendar months for one flattened gallery.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthResolver {
    pub config: ResolverConfig,
}

impl MonthResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Month shown at the top of the viewport for a scroll offset.
    ///
    /// `None` when the viewport is above the first separator or the gallery
    /// is empty.
    ///
    /// The detection offset must stay below one row height, or a scroll
    /// target landing exactly on a one-row month would resolve to the month
    /// after it. Rows no taller than the configured offset use half a row
    /// instead.
    pub fn scroll_top_to_month(
        &self,
        scroll_top: f64,
        row_height: f64,
        columns: usize,
        separators: &[SeparatorPosition],
    ) -> Option<YearMonth> {
        if row_height <= 0.0 || columns == 0 {
            return None;
        }
        let visible_row = ((scroll_top.max(0.0) + self.offset_for(row_height)) / row_height).floor() as usize;
        let first_visible = visible_row.saturating_mul(columns);
        let month = month_at_flat_index(separators, first_visible);
        trace!(scroll_top, first_visible, ?month, "Resolved month from scroll offset");
        month
    }

    fn offset_for(&self, row_height: f64) -> f64 {
        if self.config.offset_px < row_height {
            self.config.offset_px
        } else {
            row_height / 2.0
        }
    }

    /// Month at the widget's current offset, using the layout's column count.
    pub fn current_month(&self, widget: &dyn GridWidget, layout: &GalleryLayout) -> Option<YearMonth> {
        let geometry = widget.geometry();
        self.scroll_top_to_month(
            widget.scroll_top(),
            geometry.row_height,
            layout.columns,
            layout.index.separator_positions(),
        )
    }

    /// Row whose top is the month's separator.
    pub fn month_to_scroll_target(
        &self,
        index: &DateIndex,
        ym: YearMonth,
        columns: usize,
    ) -> Result<usize, GridError> {
        if columns == 0 {
            return Err(GridError::ZeroColumns);
        }
        let flat_index = index
            .flat_index_of(ym)
            .ok_or(GridError::MonthNotIndexed(ym))?;
        Ok(flat_index / columns)
    }

    /// Scrolls the widget so the month's separator row is the topmost row.
    ///
    /// Leaves the widget untouched on failure.
    pub fn scroll_to_month(
        &self,
        widget: Option<&mut dyn GridWidget>,
        layout: &GalleryLayout,
        ym: YearMonth,
    ) -> Result<usize, GridError> {
        let widget = widget.ok_or(GridError::NoWidget)?;
        let row = self.month_to_scroll_target(&layout.index, ym, layout.columns)?;
        widget.scroll_to_row(row, Align::Start);
        Ok(row)
    }
}

/// Greatest separator whose flat index is at or before `flat_index`.
///
/// `separators` must be sorted ascending by flat index.
pub fn month_at_flat_index(separators: &[SeparatorPosition], flat_index: usize) -> Option<YearMonth> {
    let after = separators.partition_point(|s| s.flat_index <= flat_index);
    after.checked_sub(1).map(|i| separators[i].year_month)
}

/// The month after `current` in the newest-first month list.
///
/// Naming hazard: "next" walks *down* the descending list, so it returns the
/// chronologically earlier month. With no current month it returns the newest.
pub fn next_month(index: &DateIndex, current: Option<YearMonth>) -> Option<YearMonth> {
    let months = index.months_descending();
    match current.and_then(|c| months.iter().position(|m| *m == c)) {
        Some(pos) => months.get(pos + 1).copied(),
        None => months.first().copied(),
    }
}

/// The month before `current` in the newest-first month list, i.e. the
/// chronologically later month. With no current month it returns the newest.
pub fn previous_month(index: &DateIndex, current: Option<YearMonth>) -> Option<YearMonth> {
    let months = index.months_descending();
    match current.and_then(|c| months.iter().position(|m| *m == c)) {
        Some(pos) => pos.checked_sub(1).and_then(|p| months.get(p).copied()),
        None => months.first().copied(),
    }
}
