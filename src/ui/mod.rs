pub mod pane;
pub mod sync;
pub mod widget;

pub use pane::{GalleryPane, PaneEvent};
pub use sync::{DualPaneView, MirrorCommand, PaneSide, ScrollSynchronizer};
pub use widget::{Align, FixedCellGrid, GridGeometry, GridWidget};
