use std::time::Duration;

/// Pixels added to the scroll offset before picking the visible row, so a
/// separator that has only just scrolled past the top edge does not flip the
/// month banner yet.
pub const MONTH_DETECTION_OFFSET_PX: f64 = 50.0;

/// Minimum spacing between scroll-driven month updates.
pub const SCROLL_UPDATE_THROTTLE: Duration = Duration::from_millis(100);

/// Quiet period after the last resize callback before dimensions are compared.
pub const DIMENSION_DEBOUNCE: Duration = Duration::from_millis(150);

/// How long scroll-driven month updates stay suppressed after a programmatic jump.
pub const RESTORE_QUIESCENCE: Duration = Duration::from_millis(300);

/// Mirror rate for synchronized panes (~60fps).
pub const SYNC_THROTTLE: Duration = Duration::from_millis(16);

/// Width/height changes smaller than this are treated as noise.
pub const DIMENSION_THRESHOLD_PX: f64 = 2.0;

/// Minimum spacing between non-immediate persistence writes.
pub const PERSIST_THROTTLE: Duration = Duration::from_millis(500);

/// Number of built layouts kept by the layout cache.
pub const MAX_CACHED_LAYOUTS: usize = 8;

/// Timer settings for one gallery pane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTimings {
    pub scroll_update_throttle: Duration,
    pub dimension_debounce: Duration,
    pub restore_quiescence: Duration,
    pub persist_throttle: Duration,
    pub dimension_threshold_px: f64,
}

impl Default for GridTimings {
    fn default() -> Self {
        Self {
            scroll_update_throttle: SCROLL_UPDATE_THROTTLE,
            dimension_debounce: DIMENSION_DEBOUNCE,
            restore_quiescence: RESTORE_QUIESCENCE,
            persist_throttle: PERSIST_THROTTLE,
            dimension_threshold_px: DIMENSION_THRESHOLD_PX,
        }
    }
}

/// Settings for the scroll offset -> month resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverConfig {
    /// Hysteresis bias in pixels (default: 50)
    pub offset_px: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            offset_px: MONTH_DETECTION_OFFSET_PX,
        }
    }
}
