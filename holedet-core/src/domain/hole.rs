//! Hole categories, hole annotations and size-string cleanup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::HoleError;
use crate::processors::BBox;

/// The four hole classes the detector is trained on.
///
/// Serialized with the Chinese labels the model reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HoleCategory {
    /// 圆孔, a closed circle sized by its diameter.
    Circle,
    /// 腰孔, a slot: two parallel edges joined by half circles.
    Slot,
    /// 螺纹孔, a threaded hole sized by its nominal M diameter.
    Thread,
    /// 矩形孔, a square or rectangular cut-out.
    Rect,
}

/// Legacy labels that older annotation rounds used for a canonical category.
pub const CATEGORY_ALIASES: &[(&str, HoleCategory)] = &[("方孔", HoleCategory::Rect)];

impl HoleCategory {
    /// Output order of the grouped label schema.
    pub const ORDER: [HoleCategory; 4] = [
        HoleCategory::Circle,
        HoleCategory::Slot,
        HoleCategory::Thread,
        HoleCategory::Rect,
    ];

    /// Label used in prompts, training targets and model output.
    pub fn label(&self) -> &'static str {
        match self {
            HoleCategory::Circle => "圆孔",
            HoleCategory::Slot => "腰孔",
            HoleCategory::Thread => "螺纹孔",
            HoleCategory::Rect => "矩形孔",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            HoleCategory::Circle => "circle_hole",
            HoleCategory::Slot => "slot_hole",
            HoleCategory::Thread => "thread_hole",
            HoleCategory::Rect => "rect_hole",
        }
    }

    /// Position in [`HoleCategory::ORDER`].
    pub fn index(&self) -> usize {
        match self {
            HoleCategory::Circle => 0,
            HoleCategory::Slot => 1,
            HoleCategory::Thread => 2,
            HoleCategory::Rect => 3,
        }
    }

    /// Resolves a label, an English name or a legacy alias.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ORDER
            .into_iter()
            .find(|c| c.label() == label || c.english_name() == label)
            .or_else(|| {
                CATEGORY_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == label)
                    .map(|(_, c)| *c)
            })
    }
}

impl std::fmt::Display for HoleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for HoleCategory {
    type Error = HoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value)
            .ok_or_else(|| HoleError::invalid_input(format!("unknown hole category '{value}'")))
    }
}

impl From<HoleCategory> for String {
    fn from(c: HoleCategory) -> Self {
        c.label().to_string()
    }
}

/// One annotated hole: category, box and raw size text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleAnnotation {
    pub category: HoleCategory,
    pub bbox: BBox,
    /// Size as typed by the annotator, cleaned up by [`extract_size_text`]
    /// when labels are assembled.
    pub size: String,
}

impl HoleAnnotation {
    pub fn new(category: HoleCategory, bbox: BBox, size: impl Into<String>) -> Self {
        Self {
            category,
            bbox,
            size: size.into(),
        }
    }

    /// Returns a copy with the box replaced, keeping category and size.
    pub fn with_bbox(&self, bbox: BBox) -> Self {
        Self {
            category: self.category,
            bbox,
            size: self.size.clone(),
        }
    }
}

static SIZE_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9*.m]").expect("static regex"));

/// Reduces a free-text size annotation to the compact size-string form.
///
/// The text is lower-cased, `x` and `×` become `*`, and only digits, `*`, `.`
/// and `m` are kept in their original order: `"M18 x 2"` gives `"m18*2"`,
/// `"Φ18mm"` gives `"18mm"`.
pub fn extract_size_text(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace(['x', '×'], "*");
    SIZE_CHAR_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_size_text() {
        assert_eq!(extract_size_text("M18 x 2"), "m18*2");
        assert_eq!(extract_size_text("Φ18mm"), "18mm");
        assert_eq!(extract_size_text(" 14×30 mm "), "14*30mm");
        assert_eq!(extract_size_text("20X14"), "20*14");
        assert_eq!(extract_size_text("R2.5"), "2.5");
        assert_eq!(extract_size_text(""), "");
    }

    #[test]
    fn test_category_lookup_and_alias() {
        assert_eq!(HoleCategory::from_label("圆孔"), Some(HoleCategory::Circle));
        assert_eq!(HoleCategory::from_label("slot_hole"), Some(HoleCategory::Slot));
        assert_eq!(HoleCategory::from_label("方孔"), Some(HoleCategory::Rect));
        assert_eq!(HoleCategory::from_label(" 螺纹孔 "), Some(HoleCategory::Thread));
        assert_eq!(HoleCategory::from_label("沉孔"), None);
    }

    #[test]
    fn test_category_serde_uses_labels() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&HoleCategory::Rect)?, "\"矩形孔\"");
        let c: HoleCategory = serde_json::from_str("\"方孔\"")?;
        assert_eq!(c, HoleCategory::Rect);
        assert!(serde_json::from_str::<HoleCategory>("\"unknown\"").is_err());
        Ok(())
    }

    #[test]
    fn test_order_matches_index() {
        for (i, c) in HoleCategory::ORDER.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }
}
