//! Media id parsing for cross-pane alignment.
//!
//! In synchronized view both panes are laid out from the union of their
//! buckets, and within each date the ids are ordered by a numeric *group key*
//! embedded in the id. Corresponding items in the source and destination pane
//! carry the same group key even though their ids and their insertion orders
//! differ, so sorting by it puts them at the same flat index in both panes.
//!
//! The id scheme is `<anything><separator><digits>` where the separator is one
//! of `-`, `_`, `:` or `/`, e.g. `src-1042`, `dst_1042`, `photo:1042`. The
//! trailing digits are the group key.
//!
//! This is a hard coupling with the data-fetching side: if the id format
//! changes so the trailing number is no longer shared between panes, the
//! synchronizer still scrolls both panes to the same offset but the items
//! at that offset stop corresponding to each other.

use std::cmp::Ordering;

/// Identifier of a media item as supplied by the data-fetching layer.
pub type MediaId = String;

const GROUP_SEPARATORS: [char; 4] = ['-', '_', ':', '/'];

/// Extracts the cross-pane group key from an id.
///
/// Returns `None` when the id has no trailing numeric segment, or the segment
/// overflows `u64`.
pub fn group_key(id: &str) -> Option<u64> {
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;

    let digits = &id[digits_start..];
    let prefix = &id[..digits_start];
    // A bare number is its own group key.
    if !prefix.is_empty() && !prefix.ends_with(GROUP_SEPARATORS) {
        return None;
    }
    digits.parse().ok()
}

/// Total order used for ids inside one date bucket in synchronized view.
///
/// Ids with a group key come first, ascending by key; ids without one follow
/// in lexicographic order. Ties on the key fall back to the id text so the
/// order never depends on which pane supplied the id first.
pub fn alignment_order(a: &str, b: &str) -> Ordering {
    match (group_key(a), group_key(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_with_prefixes() {
        assert_eq!(group_key("src-1042"), Some(1042));
        assert_eq!(group_key("dst_1042"), Some(1042));
        assert_eq!(group_key("photo:7"), Some(7));
        assert_eq!(group_key("a/b/9"), Some(9));
        assert_eq!(group_key("123"), Some(123));
    }

    #[test]
    fn test_group_key_absent() {
        assert_eq!(group_key("abc"), None);
        assert_eq!(group_key(""), None);
        assert_eq!(group_key("img42"), None);
        assert_eq!(group_key("x-99999999999999999999999"), None);
    }

    #[test]
    fn test_alignment_order() {
        let mut ids = vec!["dst-3", "zeta", "src-1", "alpha", "src-3", "dst-2"];
        ids.sort_by(|a, b| alignment_order(a, b));
        assert_eq!(ids, vec!["src-1", "dst-2", "dst-3", "src-3", "alpha", "zeta"]);
    }

    #[test]
    fn test_alignment_order_is_pane_independent() {
        let mut a = vec!["src-5", "dst-5", "src-2"];
        let mut b = vec!["dst-5", "src-2", "src-5"];
        a.sort_by(|x, y| alignment_order(x, y));
        b.sort_by(|x, y| alignment_order(x, y));
        assert_eq!(a, b);
    }
}
