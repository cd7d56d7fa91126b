//! Grouping hole annotations into the fixed four-category label schema.

use serde::{Deserialize, Serialize};

use super::hole::{HoleAnnotation, HoleCategory, extract_size_text};
use crate::core::HoleResult;
use crate::processors::BBox;

/// One entry of the label list the model learns to produce.
///
/// A placeholder entry has no box and an empty size; it is emitted for a
/// category without detections so every target has the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub category: HoleCategory,
    #[serde(with = "optional_bbox", default)]
    pub bbox_2d: Option<BBox>,
    #[serde(default)]
    pub size: String,
}

impl LabelEntry {
    pub fn placeholder(category: HoleCategory) -> Self {
        Self {
            category,
            bbox_2d: None,
            size: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.bbox_2d.is_none()
    }
}

/// Serializes `None` as `[]` and `Some(b)` as `[x1, y1, x2, y2]`.
mod optional_bbox {
    use super::BBox;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<BBox>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(b) => b.serialize(serializer),
            None => serializer.collect_seq(std::iter::empty::<i32>()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BBox>, D::Error> {
        let coords = Vec::<i32>::deserialize(deserializer)?;
        match coords.as_slice() {
            [] => Ok(None),
            [x1, y1, x2, y2] => Ok(Some(BBox::new(*x1, *y1, *x2, *y2))),
            other => Err(D::Error::invalid_length(other.len(), &"0 or 4 coordinates")),
        }
    }
}

/// Groups holes by category in [`HoleCategory::ORDER`].
///
/// Holes keep their relative order inside a category, sizes are cleaned with
/// [`extract_size_text`], and every category without holes contributes one
/// placeholder.
pub fn assemble(holes: &[HoleAnnotation]) -> Vec<LabelEntry> {
    let mut entries = Vec::with_capacity(holes.len().max(HoleCategory::ORDER.len()));
    for category in HoleCategory::ORDER {
        let before = entries.len();
        entries.extend(
            holes
                .iter()
                .filter(|h| h.category == category)
                .map(|h| LabelEntry {
                    category,
                    bbox_2d: Some(h.bbox),
                    size: extract_size_text(&h.size),
                }),
        );
        if entries.len() == before {
            entries.push(LabelEntry::placeholder(category));
        }
    }
    entries
}

/// Pretty-prints entries with two-space indentation, non-ASCII kept as is.
pub fn render_labels(entries: &[LabelEntry]) -> HoleResult<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Per-category instance counts over a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStats {
    counts: [usize; 4],
    images: usize,
}

impl LabelStats {
    pub fn record(&mut self, holes: &[HoleAnnotation]) {
        self.images += 1;
        for h in holes {
            self.counts[h.category.index()] += 1;
        }
    }

    pub fn count(&self, category: HoleCategory) -> usize {
        self.counts[category.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn images(&self) -> usize {
        self.images
    }
}

impl std::fmt::Display for LabelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} images, {} holes (", self.images, self.total())?;
        for (i, c) in HoleCategory::ORDER.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", c, self.count(*c))?;
        }
        write!(f, ")")
    }
}
