//! Date-indexed virtualization engine for chronologically bucketed media
//! galleries.
//!
//! A [`DateBucketMap`] is flattened into row-aligned [`GallerySlot`]s with a
//! separator per month ([`layout`]). The [`position`] module maps scroll
//! offsets to months and back, and restores the month a pane was showing
//! after remounts, resizes and visibility changes. [`ui::GalleryPane`] ties
//! it together for one grid widget; [`ui::DualPaneView`] mirrors two panes.

pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod persist;
pub mod position;
pub mod ui;

pub use error::GridError;
pub use layout::{build_layout, GalleryLayout, LayoutBuilder, LayoutCache, SyncMode};
pub use models::{DateBucketMap, GallerySlot, MediaId, MonthLabeler, YearMonth};
pub use ui::{DualPaneView, GalleryPane, GridWidget, PaneEvent, PaneSide};
