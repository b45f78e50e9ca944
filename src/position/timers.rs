//! Throttle and debounce primitives driven by explicit instants.
//!
//! Nothing here spawns or sleeps. The owner feeds values in with the current
//! `Instant` and asks for due values from its timer tick via `poll`. A pending
//! value lives inside the owning struct, so dropping the owner (pane unmount)
//! cancels it and a stale invocation can never fire against a widget that is
//! gone.

use std::time::{Duration, Instant};

/// Rate limiter with leading and trailing edges; the latest value wins.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    /// Offers a value. Returns it right away when the interval since the last
    /// emission has elapsed, otherwise keeps it as the trailing value,
    /// replacing any older pending one.
    pub fn offer(&mut self, now: Instant, value: T) -> Option<T> {
        if self.is_open(now) {
            self.pending = None;
            self.last_fired = Some(now);
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Emits the trailing value once its slot has arrived.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_fired = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// When the pending trailing value becomes due.
    ///
    /// A value is only ever pending after an emission, so `last_fired` is set
    /// whenever `pending` is.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_fired.map(|t| t + self.interval)
    }

    /// Drops the pending trailing value.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Drops the pending value and forgets the last emission, so the next
    /// offer fires immediately.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_fired = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn is_open(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }
}

/// Trailing-edge debounce: a value is emitted once no newer value has been
/// scheduled for `delay`.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules a value, superseding (cancelling) any pending one.
    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((due, _)) if now >= *due => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
