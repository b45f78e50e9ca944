//! Synchronized (side-by-side) view of two panes.
//!
//! Both panes are built over the union of their buckets, so a scroll offset
//! lands on the same month in either. Scroll offsets of the pane the user is
//! driving are throttled and replayed onto the other pane.

use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use tracing::{debug, trace};

use super::pane::{GalleryPane, PaneEvent};
use super::widget::GridWidget;
use crate::config::SYNC_THROTTLE;
use crate::layout::LayoutCache;
use crate::models::DateBucketMap;
use crate::position::Throttle;

/// Offsets closer than this are considered the same position.
const ECHO_TOLERANCE_PX: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneSide {
    Source,
    Destination,
}

impl PaneSide {
    pub fn other(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

/// Scroll-to-offset instruction for one pane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorCommand {
    pub target: PaneSide,
    pub scroll_top: f64,
}

/// Throttled scroll mirroring with echo suppression.
///
/// Applying a mirrored offset makes the target widget report a scroll event
/// of its own; that echo is recognized and not mirrored back. The caller
/// reports the offset the target actually settled on via [`Self::applied`],
/// since a widget may clamp the requested one.
#[derive(Debug, Clone)]
pub struct ScrollSynchronizer {
    enabled: bool,
    throttle: Throttle<MirrorCommand>,
    driving: Option<PaneSide>,
    last_applied: Option<MirrorCommand>,
}

impl Default for ScrollSynchronizer {
    fn default() -> Self {
        Self::new(SYNC_THROTTLE)
    }
}

impl ScrollSynchronizer {
    pub fn new(interval: Duration) -> Self {
        Self {
            enabled: false,
            throttle: Throttle::new(interval),
            driving: None,
            last_applied: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggling drops any pending mirror.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.clear();
    }

    /// Drops the pending mirror and all echo state.
    pub fn clear(&mut self) {
        self.throttle.reset();
        self.driving = None;
        self.last_applied = None;
    }

    pub fn is_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    /// Scroll reported by `side`. Returns a mirror command when one is due.
    pub fn on_scroll(&mut self, side: PaneSide, scroll_top: f64, now: Instant) -> Option<MirrorCommand> {
        if !self.enabled {
            return None;
        }
        if self.is_echo(side, scroll_top) {
            trace!(side = side.key(), scroll_top, "Ignoring mirrored scroll echo");
            self.last_applied = None;
            return None;
        }
        if self.driving != Some(side) {
            // The user switched panes; a pending mirror in the other direction
            // would fight the new one.
            self.throttle.reset();
            self.driving = Some(side);
        }
        let command = MirrorCommand {
            target: side.other(),
            scroll_top,
        };
        self.throttle.offer(now, command)
    }

    /// Trailing mirror once its slot has arrived.
    pub fn poll(&mut self, now: Instant) -> Option<MirrorCommand> {
        self.throttle.poll(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.next_deadline()
    }

    /// Records the offset `target` ended up at after a mirror, so its echo
    /// is not mirrored back.
    pub fn applied(&mut self, target: PaneSide, scroll_top: f64) {
        self.last_applied = Some(MirrorCommand { target, scroll_top });
    }

    fn is_echo(&self, side: PaneSide, scroll_top: f64) -> bool {
        matches!(
            self.last_applied,
            Some(c) if c.target == side && (c.scroll_top - scroll_top).abs() < ECHO_TOLERANCE_PX
        )
    }
}

/// Source and destination panes plus the synchronizer between them.
///
/// The view is the only writer to a pane's scroll offset on behalf of the
/// other pane. Route scroll events through [`DualPaneView::on_scroll`] or
/// [`DualPaneView::event_sender`], not the panes' own queues, so they reach
/// the synchronizer. A pending mirror is dropped once either pane loses its
/// widget; prefer [`DualPaneView::unmount`].
pub struct DualPaneView<W: GridWidget> {
    source: GalleryPane<W>,
    destination: GalleryPane<W>,
    sync: ScrollSynchronizer,
    events_tx: Sender<(PaneSide, PaneEvent)>,
    events_rx: Receiver<(PaneSide, PaneEvent)>,
}

impl<W: GridWidget> DualPaneView<W> {
    pub fn new() -> Self {
        let cache = Arc::new(LayoutCache::new());
        let mut source = GalleryPane::new(PaneSide::Source.key());
        let mut destination = GalleryPane::new(PaneSide::Destination.key());
        source.set_layout_cache(Arc::clone(&cache));
        destination.set_layout_cache(cache);
        Self::with_panes(source, destination)
    }

    pub fn with_panes(source: GalleryPane<W>, destination: GalleryPane<W>) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        Self {
            source,
            destination,
            sync: ScrollSynchronizer::default(),
            events_tx,
            events_rx,
        }
    }

    pub fn pane(&self, side: PaneSide) -> &GalleryPane<W> {
        match side {
            PaneSide::Source => &self.source,
            PaneSide::Destination => &self.destination,
        }
    }

    pub fn pane_mut(&mut self, side: PaneSide) -> &mut GalleryPane<W> {
        match side {
            PaneSide::Source => &mut self.source,
            PaneSide::Destination => &mut self.destination,
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.sync.is_enabled()
    }

    pub fn event_sender(&self) -> Sender<(PaneSide, PaneEvent)> {
        self.events_tx.clone()
    }

    /// Replaces both panes' buckets, rebuilding union layouts when
    /// synchronized. Each pane rebuilds once.
    pub fn set_buckets(&mut self, source: Arc<DateBucketMap>, destination: Arc<DateBucketMap>, now: Instant) {
        let (source_union, destination_union) = if self.sync.is_enabled() {
            (Some(Arc::clone(&destination)), Some(Arc::clone(&source)))
        } else {
            (None, None)
        };
        self.source.set_sources(source, source_union, now);
        self.destination.set_sources(destination, destination_union, now);
    }

    /// Turns synchronized view on or off. Each pane's layout switches
    /// between its own buckets and the union.
    pub fn set_synchronized(&mut self, enabled: bool, now: Instant) {
        if enabled == self.sync.is_enabled() {
            return;
        }
        self.sync.set_enabled(enabled);
        let (source_union, destination_union) = if enabled {
            (
                Some(Arc::clone(self.destination.buckets())),
                Some(Arc::clone(self.source.buckets())),
            )
        } else {
            (None, None)
        };
        self.source.set_union(source_union, now);
        self.destination.set_union(destination_union, now);
        debug!(enabled, "Synchronized view toggled");
    }

    /// Unmounts one pane and drops any mirror queued in either direction.
    pub fn unmount(&mut self, side: PaneSide) -> Option<W> {
        self.sync.clear();
        self.pane_mut(side).unmount()
    }

    pub fn on_scroll(&mut self, side: PaneSide, scroll_top: f64, now: Instant) {
        self.pane_mut(side).on_scroll(scroll_top, now);
        if let Some(command) = self.sync.on_scroll(side, scroll_top, now) {
            self.apply(command, now);
        }
    }

    pub fn handle_event(&mut self, side: PaneSide, event: PaneEvent, now: Instant) {
        match event {
            PaneEvent::Scrolled { scroll_top } => self.on_scroll(side, scroll_top, now),
            other => self.pane_mut(side).handle_event(other, now),
        }
    }

    /// Applies queued events, then runs both panes' timers and the trailing
    /// mirror.
    pub fn pump(&mut self, now: Instant) {
        while let Ok((side, event)) = self.events_rx.try_recv() {
            self.handle_event(side, event, now);
        }
        self.poll(now);
    }

    pub fn poll(&mut self, now: Instant) {
        self.source.pump(now);
        self.destination.pump(now);
        if self.sync.is_pending() && !self.both_mounted() {
            debug!("Pane unmounted; dropping pending scroll mirror");
            self.sync.clear();
        }
        if let Some(command) = self.sync.poll(now) {
            self.apply(command, now);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.source.next_deadline(),
            self.destination.next_deadline(),
            self.sync.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn both_mounted(&self) -> bool {
        self.source.widget().is_some() && self.destination.widget().is_some()
    }

    fn apply(&mut self, command: MirrorCommand, now: Instant) {
        if !self.both_mounted() {
            trace!(pane = command.target.key(), "Dropping mirror without both widgets");
            return;
        }
        let applied = {
            let Some(widget) = self.pane_mut(command.target).widget_mut() else {
                return;
            };
            widget.scroll_to_offset(command.scroll_top);
            widget.scroll_top()
        };
        self.sync.applied(command.target, applied);
        trace!(pane = command.target.key(), scroll_top = applied, "Mirrored scroll offset");
        self.pane_mut(command.target).on_scroll(applied, now);
    }
}

impl<W: GridWidget> Default for DualPaneView<W> {
    fn default() -> Self {
        Self::new()
    }
}
