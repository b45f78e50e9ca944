pub mod builder;
pub mod date_index;
pub mod layout_cache;

pub use builder::{build_layout, LayoutBuilder, SyncMode};
pub use date_index::{DateIndex, GalleryLayout, SeparatorPosition};
pub use layout_cache::LayoutCache;
