//! Grid lifecycle observers.
//!
//! Two detectors with different triggers: a keyed remount swaps the widget
//! instance without necessarily changing its size, and a window resize
//! changes the size without a remount. Both only report; the pane decides
//! what to restore.

use std::time::{Duration, Instant};

use tracing::debug;

use super::timers::Debounce;
use crate::config::{DIMENSION_DEBOUNCE, DIMENSION_THRESHOLD_PX};
use crate::ui::widget::GridGeometry;

/// Emitted when the widget instance identity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountEvent {
    pub instance_id: u64,
    /// Monotonically increasing count of observed mounts.
    pub mount_count: u64,
}

/// Compares the widget instance identity on every render pass.
#[derive(Debug, Clone, Default)]
pub struct RemountDetector {
    last_instance: Option<u64>,
    mount_count: u64,
}

impl RemountDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a mount when `instance_id` differs from the last seen one.
    pub fn observe(&mut self, instance_id: u64) -> Option<MountEvent> {
        if self.last_instance == Some(instance_id) {
            return None;
        }
        self.last_instance = Some(instance_id);
        self.mount_count += 1;
        debug!(instance_id, mount_count = self.mount_count, "Grid widget rendered");
        Some(MountEvent {
            instance_id,
            mount_count: self.mount_count,
        })
    }

    /// Forgets the current instance (widget unmounted). The mount counter
    /// keeps counting.
    pub fn reset(&mut self) {
        self.last_instance = None;
    }

    pub fn mount_count(&self) -> u64 {
        self.mount_count
    }
}

/// Outer box size plus column count of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub columns: usize,
}

impl Dimensions {
    pub fn new(width: f64, height: f64, columns: usize) -> Self {
        Self {
            width,
            height,
            columns,
        }
    }

    /// True when the column count differs or either side moved by at least
    /// `threshold_px`.
    pub fn differs_from(&self, other: &Dimensions, threshold_px: f64) -> bool {
        self.columns != other.columns
            || (self.width - other.width).abs() >= threshold_px
            || (self.height - other.height).abs() >= threshold_px
    }
}

impl From<GridGeometry> for Dimensions {
    fn from(geometry: GridGeometry) -> Self {
        Self::new(geometry.width, geometry.height, geometry.columns)
    }
}

/// A debounced dimension change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionChange {
    pub previous: Dimensions,
    pub current: Dimensions,
}

impl DimensionChange {
    pub fn columns_changed(&self) -> bool {
        self.previous.columns != self.current.columns
    }
}

/// Debounced resize observer. Fires only when the settled dimensions really
/// differ from the last fired (or baseline) dimensions.
#[derive(Debug, Clone)]
pub struct DimensionObserver {
    debounce: Debounce<Dimensions>,
    last: Option<Dimensions>,
    threshold_px: f64,
}

impl Default for DimensionObserver {
    fn default() -> Self {
        Self::new(DIMENSION_DEBOUNCE, DIMENSION_THRESHOLD_PX)
    }
}

impl DimensionObserver {
    pub fn new(delay: Duration, threshold_px: f64) -> Self {
        Self {
            debounce: Debounce::new(delay),
            last: None,
            threshold_px,
        }
    }

    /// Sets the reference dimensions without reporting a change, e.g. on
    /// mount where the remount detector already triggers a restoration.
    pub fn set_baseline(&mut self, dims: Dimensions) {
        self.debounce.cancel();
        self.last = Some(dims);
    }

    pub fn baseline(&self) -> Option<Dimensions> {
        self.last
    }

    /// Records a resize callback. Supersedes any pending one.
    pub fn record(&mut self, now: Instant, dims: Dimensions) {
        self.debounce.schedule(now, dims);
    }

    pub fn poll(&mut self, now: Instant) -> Option<DimensionChange> {
        let current = self.debounce.poll(now)?;
        let Some(previous) = self.last else {
            self.last = Some(current);
            return None;
        };
        if !current.differs_from(&previous, self.threshold_px) {
            return None;
        }
        self.last = Some(current);
        debug!(
            width = current.width,
            height = current.height,
            columns = current.columns,
            previous_columns = previous.columns,
            "Grid dimensions changed"
        );
        Some(DimensionChange { previous, current })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.next_deadline()
    }

    /// Drops a pending check and the baseline (widget unmounted).
    pub fn cancel(&mut self) {
        self.debounce.cancel();
        self.last = None;
    }
}
