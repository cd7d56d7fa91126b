//! View regions annotated on a drawing sheet.

use serde::{Deserialize, Serialize};

use crate::core::constants::EXPAND_VIEW_TAG;
use crate::processors::BBox;

/// A rectangle of a drawing sheet holding one view of the part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRegion {
    /// View kind as tagged by the annotator, e.g. `ExpandView`.
    pub kind: String,
    /// Pixel box in the source sheet.
    pub bbox: BBox,
}

impl ViewRegion {
    pub fn new(kind: impl Into<String>, bbox: BBox) -> Self {
        Self {
            kind: kind.into(),
            bbox,
        }
    }

    /// True for the flattened projection the hole labels are cut from.
    pub fn is_expand_view(&self) -> bool {
        self.kind == EXPAND_VIEW_TAG
    }
}

/// Returns the first expanded view among `regions`.
pub fn first_expand_view(regions: &[ViewRegion]) -> Option<&ViewRegion> {
    regions.iter().find(|r| r.is_expand_view())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_expand_view() {
        let regions = vec![
            ViewRegion::new("MainView", BBox::new(0, 0, 10, 10)),
            ViewRegion::new("ExpandView", BBox::new(5, 5, 50, 50)),
            ViewRegion::new("ExpandView", BBox::new(60, 60, 90, 90)),
        ];
        let view = first_expand_view(&regions).map(|r| r.bbox);
        assert_eq!(view, Some(BBox::new(5, 5, 50, 50)));
        assert!(first_expand_view(&regions[..1]).is_none());
    }
}
