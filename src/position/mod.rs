//! Scroll position tracking: month resolution, restoration and the timers
//! and observers that drive them.

pub mod observers;
pub mod resolver;
pub mod restore;
pub mod timers;

pub use observers::{DimensionChange, DimensionObserver, Dimensions, MountEvent, RemountDetector};
pub use resolver::{month_at_flat_index, next_month, previous_month, MonthResolver};
pub use restore::{Restoration, RestorationController, RestoreState, RestoreTrigger};
pub use timers::{Debounce, Throttle};
