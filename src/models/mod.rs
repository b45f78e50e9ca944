pub mod media_id;
pub mod slot;
pub mod year_month;

pub use media_id::*;
pub use slot::*;
pub use year_month::*;

use std::collections::HashMap;

/// Date (`YYYY-MM-DD`) to ordered media ids, as delivered by the fetch layer.
///
/// Order within a date is render order. Key order carries no meaning.
pub type DateBucketMap = HashMap<String, Vec<MediaId>>;
