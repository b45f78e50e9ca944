//! One gallery pane: layout, widget, position state and timers.
//!
//! The host feeds widget callbacks in either directly (`on_scroll`,
//! `on_render`, ...) or as [`PaneEvent`]s through [`GalleryPane::event_sender`],
//! and drives timers by calling [`GalleryPane::pump`] (or `poll`) from its
//! main-loop tick. All timers live inside the pane; `unmount` cancels them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use flume::{Receiver, Sender};
use tracing::{debug, trace};

use super::widget::GridWidget;
use crate::config::GridTimings;
use crate::error::GridError;
use crate::layout::{GalleryLayout, LayoutBuilder, LayoutCache, SyncMode};
use crate::models::{DateBucketMap, GallerySlot, YearMonth};
use crate::persist::{PositionStore, PositionWriter};
use crate::position::{
    next_month, previous_month, DimensionObserver, Dimensions, MonthResolver, MountEvent,
    RemountDetector, Restoration, RestorationController, RestoreTrigger, Throttle,
};

/// Widget callbacks queued by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaneEvent {
    /// The widget scrolled to a new offset.
    Scrolled { scroll_top: f64 },
    /// A render pass completed; the widget instance may have changed.
    Rendered,
    /// The widget's outer box was measured.
    Resized(Dimensions),
    VisibilityChanged { visible: bool },
}

pub struct GalleryPane<W: GridWidget> {
    key: String,
    builder: LayoutBuilder,
    cache: Arc<LayoutCache>,
    buckets: Arc<DateBucketMap>,
    union: Option<Arc<DateBucketMap>>,
    layout: Arc<GalleryLayout>,
    widget: Option<W>,
    visible: bool,
    restore: RestorationController,
    remounts: RemountDetector,
    dimensions: DimensionObserver,
    scroll_updates: Throttle<f64>,
    writer: Option<PositionWriter>,
    /// Persisted month waiting for a widget and an index that contains it.
    pending_initial: Option<YearMonth>,
    timings: GridTimings,
    events_tx: Sender<PaneEvent>,
    events_rx: Receiver<PaneEvent>,
}

impl<W: GridWidget> GalleryPane<W> {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_timings(key, GridTimings::default())
    }

    pub fn with_timings(key: impl Into<String>, timings: GridTimings) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        Self {
            key: key.into(),
            builder: LayoutBuilder::new(),
            cache: Arc::new(LayoutCache::new()),
            buckets: Arc::new(DateBucketMap::new()),
            union: None,
            layout: Arc::new(GalleryLayout::empty(1)),
            widget: None,
            visible: true,
            restore: RestorationController::new(timings.restore_quiescence, MonthResolver::default()),
            remounts: RemountDetector::new(),
            dimensions: DimensionObserver::new(timings.dimension_debounce, timings.dimension_threshold_px),
            scroll_updates: Throttle::new(timings.scroll_update_throttle),
            writer: None,
            pending_initial: None,
            timings,
            events_tx,
            events_rx,
        }
    }

    /// Shares a layout cache with other panes.
    pub fn set_layout_cache(&mut self, cache: Arc<LayoutCache>) {
        self.cache = cache;
    }

    /// Replaces the label source (e.g. a localized labeler) and rebuilds.
    pub fn set_builder(&mut self, builder: LayoutBuilder) {
        self.builder = builder;
        self.cache.clear();
        self.rebuild(self.columns());
    }

    /// Persists this pane's month to `store` and seeds the position from it.
    ///
    /// With a widget already mounted the stored month is restored right away
    /// if the index contains it. Otherwise it is restored on mount, or as
    /// soon as the index contains it.
    pub fn persist_to(&mut self, store: Box<dyn PositionStore>, now: Instant) {
        let writer = PositionWriter::with_interval(self.key.clone(), store, self.timings.persist_throttle);
        let stored = writer.read();
        self.writer = Some(writer);
        let Some(ym) = stored else {
            return;
        };
        debug!(pane = %self.key, month = %ym, "Loaded persisted position");
        self.pending_initial = Some(ym);
        if self.widget.is_none() {
            self.restore.remember(ym);
        } else {
            // A mounted grid only reports the month once it shows it.
            self.retry_initial(now);
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn event_sender(&self) -> Sender<PaneEvent> {
        self.events_tx.clone()
    }

    // ---- data ----

    pub fn set_buckets(&mut self, buckets: Arc<DateBucketMap>, now: Instant) {
        let union = self.union.clone();
        self.set_sources(buckets, union, now);
    }

    /// Sets or clears the other pane's buckets for synchronized view.
    pub fn set_union(&mut self, union: Option<Arc<DateBucketMap>>, now: Instant) {
        let buckets = Arc::clone(&self.buckets);
        self.set_sources(buckets, union, now);
    }

    /// Replaces own buckets and the union together, with a single rebuild.
    pub fn set_sources(
        &mut self,
        buckets: Arc<DateBucketMap>,
        union: Option<Arc<DateBucketMap>>,
        now: Instant,
    ) {
        self.buckets = buckets;
        self.union = union;
        if self.rebuild(self.columns()) {
            self.retry_initial(now);
        }
    }

    pub fn buckets(&self) -> &Arc<DateBucketMap> {
        &self.buckets
    }

    pub fn is_synced(&self) -> bool {
        self.union.is_some()
    }

    /// Replaces the layout when inputs changed. Returns true if it did.
    fn rebuild(&mut self, columns: usize) -> bool {
        let sync = match &self.union {
            Some(other) => SyncMode::Union(other.as_ref()),
            None => SyncMode::Off,
        };
        let layout = self.cache.get_or_build(&self.builder, &self.buckets, columns, sync);
        if Arc::ptr_eq(&layout, &self.layout) {
            return false;
        }
        self.layout = layout;
        if let Some(widget) = &mut self.widget {
            widget.set_row_count(self.layout.row_count());
        }
        debug!(
            pane = %self.key,
            columns = self.layout.columns,
            rows = self.layout.row_count(),
            "Pane layout replaced"
        );
        true
    }

    fn retry_initial(&mut self, now: Instant) {
        if let Some(ym) = self.pending_initial {
            if self.widget.is_some() && self.layout.index.contains_month(ym) {
                // Failure is logged inside and leaves the month pending.
                let _ = self.restore_with(RestoreTrigger::InitialMount(ym), now);
            }
        }
    }

    // ---- widget lifecycle ----

    /// Attaches a widget and runs the first render pass.
    pub fn mount(&mut self, widget: W, now: Instant) -> Option<MountEvent> {
        self.widget = Some(widget);
        self.on_render(now)
    }

    /// Detaches the widget. Cancels every pending timer and flushes a
    /// pending persistence write.
    pub fn unmount(&mut self) -> Option<W> {
        self.restore.cancel();
        self.dimensions.cancel();
        self.scroll_updates.reset();
        self.remounts.reset();
        if let Some(writer) = &mut self.writer {
            writer.flush();
        }
        debug!(pane = %self.key, "Pane unmounted");
        self.widget.take()
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut W> {
        self.widget.as_mut()
    }

    /// Render-pass hook. Restores the position when the widget instance
    /// changed since the last pass.
    pub fn on_render(&mut self, now: Instant) -> Option<MountEvent> {
        let (instance_id, geometry) = match &self.widget {
            Some(widget) => (widget.instance_id(), widget.geometry()),
            None => return None,
        };
        let event = self.remounts.observe(instance_id)?;

        self.dimensions.set_baseline(geometry.into());
        if !self.rebuild(geometry.columns.max(1)) {
            if let Some(widget) = &mut self.widget {
                widget.set_row_count(self.layout.row_count());
            }
        }

        let trigger = match self.pending_initial {
            Some(ym) => RestoreTrigger::InitialMount(ym),
            None => RestoreTrigger::Remounted,
        };
        // A fresh pane has nothing to restore yet.
        let _ = self.restore_with(trigger, now);
        Some(event)
    }

    pub fn on_resize(&mut self, dims: Dimensions, now: Instant) {
        self.dimensions.record(now, dims);
    }

    /// Scroll callback. Month updates are throttled and dropped while a
    /// restoration is in progress.
    pub fn on_scroll(&mut self, scroll_top: f64, now: Instant) {
        if self.restore.is_restoring() {
            trace!(pane = %self.key, scroll_top, "Scroll during restoration ignored");
            return;
        }
        if let Some(scroll_top) = self.scroll_updates.offer(now, scroll_top) {
            self.apply_scroll(scroll_top, now);
        }
    }

    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        let became_visible = visible && !self.visible;
        self.visible = visible;
        if became_visible {
            let _ = self.restore_with(RestoreTrigger::BecameVisible, now);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn handle_event(&mut self, event: PaneEvent, now: Instant) {
        match event {
            PaneEvent::Scrolled { scroll_top } => self.on_scroll(scroll_top, now),
            PaneEvent::Rendered => {
                self.on_render(now);
            }
            PaneEvent::Resized(dims) => self.on_resize(dims, now),
            PaneEvent::VisibilityChanged { visible } => self.set_visible(visible, now),
        }
    }

    /// Applies all queued events in order, then runs due timers.
    pub fn pump(&mut self, now: Instant) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event, now);
        }
        self.poll(now);
    }

    /// Runs due timers: restoration quiescence, settled resizes, trailing
    /// scroll updates and persistence writes.
    pub fn poll(&mut self, now: Instant) {
        self.restore.poll(now);

        if let Some(change) = self.dimensions.poll(now) {
            if change.columns_changed() {
                self.rebuild(change.current.columns.max(1));
            }
            let _ = self.restore_with(RestoreTrigger::Resized, now);
        }

        if self.restore.is_restoring() {
            self.scroll_updates.cancel();
        } else if let Some(scroll_top) = self.scroll_updates.poll(now) {
            self.apply_scroll(scroll_top, now);
        }

        if let Some(writer) = &mut self.writer {
            writer.poll(now);
        }
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.restore.next_deadline(),
            self.dimensions.next_deadline(),
            self.scroll_updates.next_deadline(),
            self.writer.as_ref().and_then(PositionWriter::next_deadline),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn apply_scroll(&mut self, scroll_top: f64, now: Instant) -> Option<YearMonth> {
        let row_height = self.widget.as_ref()?.geometry().row_height;
        let reading = self.restore.resolver().scroll_top_to_month(
            scroll_top,
            row_height,
            self.layout.columns,
            self.layout.index.separator_positions(),
        );
        let month = self.restore.apply_scroll_reading(reading)?;
        trace!(pane = %self.key, month = %month, "Current month changed by scroll");
        self.persist(month, false, now);
        Some(month)
    }

    fn restore_with(&mut self, trigger: RestoreTrigger, now: Instant) -> Result<Restoration, GridError> {
        let widget = self.widget.as_mut().map(|w| w as &mut dyn GridWidget);
        match self.restore.begin(trigger, now, widget, &self.layout) {
            Ok(restoration) => {
                if matches!(trigger, RestoreTrigger::InitialMount(_)) {
                    self.pending_initial = None;
                }
                // Readings captured before the jump are stale.
                self.scroll_updates.cancel();
                self.persist(restoration.year_month, restoration.persist_immediately, now);
                Ok(restoration)
            }
            Err(e) => {
                debug!(pane = %self.key, ?trigger, "Position not restored: {}", e);
                Err(e)
            }
        }
    }

    fn persist(&mut self, ym: YearMonth, immediate: bool, now: Instant) {
        if let Some(writer) = &mut self.writer {
            writer.write(ym, immediate, now);
        }
    }

    // ---- navigation ----

    /// Scrolls so the month's separator row is at the top.
    pub fn scroll_to_year_month(&mut self, year: i32, month: u32, now: Instant) -> Result<Restoration, GridError> {
        let ym = YearMonth::new(year, month)?;
        self.restore_with(RestoreTrigger::Jump(ym), now)
    }

    /// Toolbar month picker.
    pub fn select_month(&mut self, year: i32, month: u32, now: Instant) -> Result<Restoration, GridError> {
        self.scroll_to_year_month(year, month, now)
    }

    /// Jumps to the chronologically earlier month. `Ok(None)` at the oldest.
    pub fn next_month(&mut self, now: Instant) -> Result<Option<Restoration>, GridError> {
        match next_month(&self.layout.index, self.restore.current_year_month()) {
            Some(ym) => self.restore_with(RestoreTrigger::Jump(ym), now).map(Some),
            None => Ok(None),
        }
    }

    /// Jumps to the chronologically later month. `Ok(None)` at the newest.
    pub fn previous_month(&mut self, now: Instant) -> Result<Option<Restoration>, GridError> {
        match previous_month(&self.layout.index, self.restore.current_year_month()) {
            Some(ym) => self.restore_with(RestoreTrigger::Jump(ym), now).map(Some),
            None => Ok(None),
        }
    }

    // ---- state for the toolbar and the grid ----

    pub fn current_year_month(&self) -> Option<YearMonth> {
        self.restore.current_year_month()
    }

    /// Banner text for the current month.
    pub fn current_label(&self) -> Option<String> {
        self.current_year_month().map(|ym| self.builder.label(ym))
    }

    pub fn years(&self) -> &[i32] {
        self.layout.index.years()
    }

    pub fn months_by_year(&self) -> &BTreeMap<i32, Vec<u32>> {
        self.layout.index.months_by_year()
    }

    pub fn layout(&self) -> &Arc<GalleryLayout> {
        &self.layout
    }

    pub fn row_count(&self) -> usize {
        self.layout.row_count()
    }

    pub fn slot_at(&self, row: usize, col: usize) -> Option<&GallerySlot> {
        self.layout.slot_at(row, col)
    }

    pub fn columns(&self) -> usize {
        self.widget
            .as_ref()
            .map_or(self.layout.columns, |w| w.geometry().columns.max(1))
    }

    pub fn is_restoring(&self) -> bool {
        self.restore.is_restoring()
    }

    pub fn mount_count(&self) -> u64 {
        self.remounts.mount_count()
    }
}
