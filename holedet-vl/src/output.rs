//! Parsing detections out of raw model responses.
//!
//! The model answers with prose around a fenced ```` ```json ```` block. Only
//! the first block is read and it is parsed with `serde_json`; anything that
//! is not a JSON array of detections is reported as
//! [`HoleError::ModelOutput`] so the caller can skip that image.

use holedet_core::core::{HoleError, HoleResult};
use holedet_core::domain::HoleCategory;
use holedet_core::processors::BBox;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

static JSON_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)```").expect("static regex"));

/// Returns the trimmed body of the first fenced JSON block.
pub fn extract_json_block(text: &str) -> HoleResult<&str> {
    JSON_BLOCK_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| HoleError::model_output("no ```json block in response"))
}

/// A single detection as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Category text as written by the model.
    pub category: String,
    /// `None` for placeholder entries.
    pub bbox_2d: Option<BBox>,
    pub size: String,
}

impl Detection {
    /// Canonical category, if the text names one of the four classes.
    pub fn hole_category(&self) -> Option<HoleCategory> {
        HoleCategory::from_label(&self.category)
    }
}

#[derive(Deserialize)]
struct RawDetection {
    #[serde(default)]
    category: String,
    #[serde(default, alias = "bbox")]
    bbox_2d: Vec<f64>,
    #[serde(default)]
    size: Value,
}

impl RawDetection {
    fn into_detection(self) -> Option<Detection> {
        let bbox_2d = match self.bbox_2d.as_slice() {
            [] => None,
            [x1, y1, x2, y2] => Some(BBox::new(
                x1.round() as i32,
                y1.round() as i32,
                x2.round() as i32,
                y2.round() as i32,
            )),
            other => {
                warn!(
                    "Dropping '{}' detection with {} coordinates",
                    self.category,
                    other.len()
                );
                return None;
            }
        };
        let size = match self.size {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        Some(Detection {
            category: self.category,
            bbox_2d,
            size,
        })
    }
}

/// Extracts and parses the detections of a model response.
///
/// Entries whose box is neither empty nor four numbers are dropped with a
/// warning; a block that is not a JSON array of objects fails the whole
/// response.
pub fn parse_detections(text: &str) -> HoleResult<Vec<Detection>> {
    let block = extract_json_block(text)?;
    let raw: Vec<RawDetection> = serde_json::from_str(block)
        .map_err(|e| HoleError::model_output(format!("invalid detection JSON: {e}")))?;
    Ok(raw.into_iter().filter_map(RawDetection::into_detection).collect())
}

/// Groups boxes by category text, in order of first appearance.
///
/// Placeholder entries still create their group, which then stays empty.
pub fn group_by_category(detections: &[Detection]) -> Vec<(String, Vec<BBox>)> {
    let mut groups: Vec<(String, Vec<BBox>)> = Vec::new();
    for det in detections {
        let idx = match groups.iter().position(|(c, _)| *c == det.category) {
            Some(idx) => idx,
            None => {
                groups.push((det.category.clone(), Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(b) = det.bbox_2d {
            groups[idx].1.push(b);
        }
    }
    groups
}
