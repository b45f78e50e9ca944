//! Persistence of the current month per pane.
//!
//! - `QueryPositionSource` - URL query parameter (`month_<pane>=YYYY-MM`)
//! - `SqlitePositionStore` - local storage in SQLite
//! - `LayeredPositionStore` - both, URL preferred on read
//! - `PositionWriter` - throttles scroll-driven writes for one pane

pub mod query;
pub mod store;

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::PERSIST_THROTTLE;
use crate::models::YearMonth;
use crate::position::Throttle;

pub use query::QueryPositionSource;
pub use store::SqlitePositionStore;

/// Durable storage of one month per pane key.
pub trait PositionStore {
    fn read(&self, pane: &str) -> Result<Option<YearMonth>>;
    fn write(&mut self, pane: &str, ym: YearMonth) -> Result<()>;
}

/// Precedence between a URL-supplied and a storage-supplied month on first
/// load: the URL wins whenever it holds a valid month, storage fills in
/// otherwise. A shared link therefore always opens where it points, and a
/// bare URL resumes where the user left off.
pub fn resolve_persisted(from_url: Option<YearMonth>, from_storage: Option<YearMonth>) -> Option<YearMonth> {
    from_url.or(from_storage)
}

/// URL query plus optional local storage.
pub struct LayeredPositionStore {
    query: QueryPositionSource,
    storage: Option<SqlitePositionStore>,
}

impl LayeredPositionStore {
    pub fn new(query: QueryPositionSource, storage: Option<SqlitePositionStore>) -> Self {
        Self { query, storage }
    }

    pub fn query(&self) -> &QueryPositionSource {
        &self.query
    }
}

impl PositionStore for LayeredPositionStore {
    fn read(&self, pane: &str) -> Result<Option<YearMonth>> {
        let from_url = self.query.read(pane)?;
        let from_storage = match &self.storage {
            Some(storage) => storage.read(pane).unwrap_or_else(|e| {
                warn!(pane, "Failed to read stored position: {:#}", e);
                None
            }),
            None => None,
        };
        Ok(resolve_persisted(from_url, from_storage))
    }

    fn write(&mut self, pane: &str, ym: YearMonth) -> Result<()> {
        self.query.write(pane, ym)?;
        if let Some(storage) = &mut self.storage {
            storage.write(pane, ym)?;
        }
        Ok(())
    }
}

/// Writes one pane's month to a store, throttling scroll-driven writes.
///
/// An immediate write cancels any pending throttled one so a stale month
/// can never land after a user-driven jump.
pub struct PositionWriter {
    pane: String,
    store: Box<dyn PositionStore>,
    throttle: Throttle<YearMonth>,
    last_written: Option<YearMonth>,
}

impl PositionWriter {
    pub fn new(pane: impl Into<String>, store: Box<dyn PositionStore>) -> Self {
        Self::with_interval(pane, store, PERSIST_THROTTLE)
    }

    pub fn with_interval(pane: impl Into<String>, store: Box<dyn PositionStore>, interval: Duration) -> Self {
        Self {
            pane: pane.into(),
            store,
            throttle: Throttle::new(interval),
            last_written: None,
        }
    }

    pub fn pane(&self) -> &str {
        &self.pane
    }

    /// Persisted month for this pane; read failures count as absent.
    pub fn read(&self) -> Option<YearMonth> {
        self.store.read(&self.pane).unwrap_or_else(|e| {
            warn!(pane = %self.pane, "Failed to read persisted position: {:#}", e);
            None
        })
    }

    pub fn write(&mut self, ym: YearMonth, immediate: bool, now: Instant) {
        if immediate {
            self.throttle.cancel();
            self.commit(ym);
        } else if let Some(ym) = self.throttle.offer(now, ym) {
            self.commit(ym);
        }
    }

    /// Flushes a due trailing write.
    pub fn poll(&mut self, now: Instant) {
        if let Some(ym) = self.throttle.poll(now) {
            self.commit(ym);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.next_deadline()
    }

    /// Writes the pending month, if any, without waiting for its slot.
    pub fn flush(&mut self) {
        if let Some(ym) = self.throttle.cancel() {
            self.commit(ym);
        }
    }

    pub fn last_written(&self) -> Option<YearMonth> {
        self.last_written
    }

    fn commit(&mut self, ym: YearMonth) {
        if self.last_written == Some(ym) {
            return;
        }
        match self.store.write(&self.pane, ym) {
            Ok(()) => {
                debug!(pane = %self.pane, month = %ym, "Persisted position");
                self.last_written = Some(ym);
            }
            Err(e) => warn!(pane = %self.pane, "Failed to persist position: {:#}", e),
        }
    }
}
