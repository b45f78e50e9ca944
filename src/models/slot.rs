use super::{MediaId, YearMonth};

/// One position in the flattened gallery sequence.
///
/// Every variant carries its `flat_index`; the virtualized grid addresses
/// cells by `row * columns + col` and gets exactly one slot back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GallerySlot {
    /// A real, presentable item.
    Media { id: MediaId, flat_index: usize },
    /// Month header spanning a full row. Always at a row start.
    Separator {
        year_month: YearMonth,
        label: String,
        flat_index: usize,
    },
    /// Inert filler that pushes the next separator onto a fresh row.
    Padding { flat_index: usize },
    /// Synchronized view only: the other pane has this id for the month, this
    /// pane does not.
    Missing { id: MediaId, flat_index: usize },
}

impl GallerySlot {
    pub fn flat_index(&self) -> usize {
        match self {
            Self::Media { flat_index, .. }
            | Self::Separator { flat_index, .. }
            | Self::Padding { flat_index }
            | Self::Missing { flat_index, .. } => *flat_index,
        }
    }

    /// Only media slots may be selected or resolved against the media store.
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Media { .. })
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator { .. })
    }

    /// The id to fetch thumbnails for. Padding, separators and missing
    /// placeholders never trigger fetches.
    pub fn media_id(&self) -> Option<&str> {
        match self {
            Self::Media { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn year_month(&self) -> Option<YearMonth> {
        match self {
            Self::Separator { year_month, .. } => Some(*year_month),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_media_is_selectable() {
        let media = GallerySlot::Media {
            id: "a".into(),
            flat_index: 1,
        };
        let missing = GallerySlot::Missing {
            id: "b".into(),
            flat_index: 2,
        };
        let padding = GallerySlot::Padding { flat_index: 3 };

        assert!(media.is_selectable());
        assert_eq!(media.media_id(), Some("a"));
        assert!(!missing.is_selectable());
        assert_eq!(missing.media_id(), None);
        assert!(!padding.is_selectable());
        assert_eq!(padding.flat_index(), 3);
    }

    #[test]
    fn test_separator_accessors() {
        let ym = YearMonth::new(2024, 3).unwrap();
        let sep = GallerySlot::Separator {
            year_month: ym,
            label: ym.label(),
            flat_index: 0,
        };
        assert!(sep.is_separator());
        assert_eq!(sep.year_month(), Some(ym));
        assert!(!sep.is_selectable());
    }
}
