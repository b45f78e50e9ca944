//! Per-pane position restoration state machine.
//!
//! Windowing widgets recompute their layout on remount and resize and reset
//! their own scroll offset while doing so. The controller remembers the
//! month the user was looking at and re-applies it after every such event.
//!
//! ```text
//!            trigger (remount | resize | visible | initial | jump)
//!   Idle ────────────────────────────────────────────────▶ Restoring
//!    ▲                                                        │
//!    └────────────── quiescence window elapsed ───────────────┘
//! ```
//!
//! While `Restoring`, scroll-driven month readings are dropped so the
//! programmatic jump is not overwritten by an offset captured before it.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::resolver::MonthResolver;
use crate::config::RESTORE_QUIESCENCE;
use crate::error::GridError;
use crate::layout::GalleryLayout;
use crate::models::YearMonth;
use crate::ui::widget::GridWidget;

/// Why a restoration is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreTrigger {
    /// The widget instance changed.
    Remounted,
    /// Width, height or column count changed.
    Resized,
    /// The pane went from hidden to visible.
    BecameVisible,
    /// First mount with a month read from persistence.
    InitialMount(YearMonth),
    /// The user picked a month.
    Jump(YearMonth),
}

impl RestoreTrigger {
    fn explicit_target(&self) -> Option<YearMonth> {
        match self {
            Self::InitialMount(ym) | Self::Jump(ym) => Some(*ym),
            _ => None,
        }
    }

    /// User-driven and visibility-driven restorations write through to
    /// persistence right away, bypassing the write throttle.
    pub fn persists_immediately(&self) -> bool {
        matches!(self, Self::Jump(_) | Self::BecameVisible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Idle,
    Restoring { until: Instant },
}

/// Outcome of entering `Restoring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restoration {
    pub year_month: YearMonth,
    pub row: usize,
    pub persist_immediately: bool,
}

/// Current month plus the restoration lock for one pane.
#[derive(Debug, Clone)]
pub struct RestorationController {
    current: Option<YearMonth>,
    state: RestoreState,
    quiescence: Duration,
    resolver: MonthResolver,
}

impl Default for RestorationController {
    fn default() -> Self {
        Self::new(RESTORE_QUIESCENCE, MonthResolver::default())
    }
}

impl RestorationController {
    pub fn new(quiescence: Duration, resolver: MonthResolver) -> Self {
        Self {
            current: None,
            state: RestoreState::Idle,
            quiescence,
            resolver,
        }
    }

    pub fn current_year_month(&self) -> Option<YearMonth> {
        self.current
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self.state, RestoreState::Restoring { .. })
    }

    pub fn resolver(&self) -> &MonthResolver {
        &self.resolver
    }

    /// Enters `Restoring` and scrolls the widget to the target month.
    ///
    /// The target is the trigger's explicit month, else the last known
    /// current month. On error nothing changes: no scroll, no state change,
    /// the previous month is kept.
    pub fn begin(
        &mut self,
        trigger: RestoreTrigger,
        now: Instant,
        widget: Option<&mut dyn GridWidget>,
        layout: &GalleryLayout,
    ) -> Result<Restoration, GridError> {
        let target = trigger
            .explicit_target()
            .or(self.current)
            .ok_or(GridError::NoPosition)?;

        let row = self.resolver.scroll_to_month(widget, layout, target)?;

        self.current = Some(target);
        self.state = RestoreState::Restoring {
            until: now + self.quiescence,
        };
        debug!(?trigger, month = %target, row, "Restoring grid position");

        Ok(Restoration {
            year_month: target,
            row,
            persist_immediately: trigger.persists_immediately(),
        })
    }

    /// Leaves `Restoring` once the quiescence window has passed.
    /// Returns true on that transition.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            RestoreState::Restoring { until } if now >= until => {
                self.state = RestoreState::Idle;
                debug!(month = ?self.current, "Restoration settled");
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            RestoreState::Restoring { until } => Some(until),
            RestoreState::Idle => None,
        }
    }

    /// Applies a scroll-derived month reading.
    ///
    /// Dropped while restoring. Returns the new month when it changed.
    pub fn apply_scroll_reading(&mut self, reading: Option<YearMonth>) -> Option<YearMonth> {
        if self.is_restoring() {
            trace!(?reading, "Dropping scroll reading during restoration");
            return None;
        }
        let month = reading?;
        if self.current == Some(month) {
            return None;
        }
        self.current = Some(month);
        Some(month)
    }

    /// Forgets the restoration window without touching the current month.
    /// Called on unmount so no restoration outlives its widget.
    pub fn cancel(&mut self) {
        self.state = RestoreState::Idle;
    }

    /// Seeds the remembered month without scrolling (e.g. from persistence
    /// before any widget exists).
    pub fn remember(&mut self, ym: YearMonth) {
        self.current = Some(ym);
    }
}
