//! Label Studio export parsing.
//!
//! An export is a JSON array of tasks. Every task points at one drawing sheet
//! through `data.image` and carries two annotation sets: index 0 holds the
//! hole boxes, index 1 the view regions. Boxes are `rectanglelabels` results
//! in percent of the sheet; `textarea` results that share a box's `id` carry
//! the size text typed for it.
//!
//! Fields this crate does not read are kept in `extra` maps so that the split
//! files written back out match the input.

use holedet_core::core::{HoleError, HoleResult};
use holedet_core::domain::{HoleAnnotation, HoleCategory, ViewRegion};
use holedet_core::processors::BBox;
use holedet_core::processors::round_half_even;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

const RECTANGLE_TYPE: &str = "rectanglelabels";
const TEXTAREA_TYPE: &str = "textarea";

/// Index of the hole annotation set inside a task.
pub const HOLES_SET: usize = 0;
/// Index of the view annotation set inside a task.
pub const VIEWS_SET: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    pub data: TaskData,
    #[serde(default)]
    pub annotations: Vec<AnnotationSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    /// URL or path of the drawing sheet; used as the record key.
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(default)]
    pub result: Vec<ResultItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<u32>,
    #[serde(default)]
    pub value: ResultValue,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Geometry is in percent of the original sheet size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rectanglelabels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A parsed region: pixel box, rotation, result type, tag and size texts.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAnnotation {
    pub bbox: BBox,
    pub rotation: f64,
    pub label_type: String,
    pub tag: String,
    pub sizes: Vec<String>,
}

impl RegionAnnotation {
    /// First size text, if the annotator entered one.
    pub fn size(&self) -> Option<&str> {
        self.sizes
            .iter()
            .map(|s| s.as_str())
            .find(|s| !s.trim().is_empty())
    }

    pub fn to_view_region(&self) -> ViewRegion {
        ViewRegion::new(self.tag.clone(), self.bbox)
    }

    /// The hole this region describes, or `None` for tags outside the four
    /// hole categories.
    pub fn to_hole(&self) -> Option<HoleAnnotation> {
        let category = HoleCategory::from_label(&self.tag)?;
        Some(HoleAnnotation::new(
            category,
            self.bbox,
            self.size().unwrap_or_default(),
        ))
    }
}

/// Regions of every sheet, keyed by image reference.
pub type RegionIndex = BTreeMap<String, Vec<RegionAnnotation>>;

pub fn load_export(path: &Path) -> HoleResult<Vec<ExportTask>> {
    let text = std::fs::read_to_string(path)?;
    let tasks: Vec<ExportTask> = serde_json::from_str(&text)?;
    debug!("Loaded {} tasks from {}", tasks.len(), path.display());
    Ok(tasks)
}

pub fn write_export(path: &Path, tasks: &[ExportTask]) -> HoleResult<()> {
    let text = serde_json::to_string_pretty(tasks)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Splits a task into a holes-only task and a views-only task.
pub fn split_task(task: &ExportTask) -> HoleResult<(ExportTask, ExportTask)> {
    if task.annotations.len() <= VIEWS_SET {
        return Err(HoleError::malformed_annotation(
            &task.data.image,
            format!(
                "expected hole and view annotation sets, found {}",
                task.annotations.len()
            ),
        ));
    }
    let with_set = |set: usize| ExportTask {
        annotations: vec![task.annotations[set].clone()],
        ..task.clone()
    };
    Ok((with_set(HOLES_SET), with_set(VIEWS_SET)))
}

/// Holes-only and views-only copies of an export.
#[derive(Debug, Clone, Default)]
pub struct SplitExport {
    pub holes: Vec<ExportTask>,
    pub views: Vec<ExportTask>,
}

/// Splits every task, dropping (and logging) tasks without both sets.
pub fn split_export(tasks: &[ExportTask]) -> SplitExport {
    let mut split = SplitExport::default();
    for task in tasks {
        match split_task(task) {
            Ok((holes, views)) => {
                split.holes.push(holes);
                split.views.push(views);
            }
            Err(e) => warn!("Skipping task: {}", e),
        }
    }
    split
}

fn percent_to_pixels(percent: f64, dim: u32) -> i32 {
    round_half_even(percent / 100.0 * f64::from(dim)) as i32
}

/// Converts one `rectanglelabels` result to a region, attaching `sizes`.
///
/// Rotation is recorded but not applied to the box.
pub fn parse_region(item: &ResultItem, sizes: Vec<String>) -> Option<RegionAnnotation> {
    let v = &item.value;
    let (Some(x), Some(y), Some(w), Some(h)) = (v.x, v.y, v.width, v.height) else {
        return None;
    };
    let (Some(ow), Some(oh)) = (item.original_width, item.original_height) else {
        return None;
    };
    let tag = v.rectanglelabels.first()?.clone();
    let bbox = BBox::new(
        percent_to_pixels(x, ow),
        percent_to_pixels(y, oh),
        percent_to_pixels(x + w, ow),
        percent_to_pixels(y + h, oh),
    )
    .sorted();
    let rotation = v.rotation.unwrap_or(0.0);
    if rotation != 0.0 {
        warn!(
            "Region '{}' is rotated by {rotation} degrees, using its unrotated box",
            item.id
        );
    }
    Some(RegionAnnotation {
        bbox,
        rotation,
        label_type: item.kind.clone(),
        tag,
        sizes,
    })
}

/// Parses the regions of one annotation set.
pub fn parse_annotation_set(set: &AnnotationSet) -> Vec<RegionAnnotation> {
    let mut texts: HashMap<&str, Vec<String>> = HashMap::new();
    for item in set.result.iter().filter(|r| r.kind == TEXTAREA_TYPE) {
        texts
            .entry(item.id.as_str())
            .or_default()
            .extend(item.value.text.iter().cloned());
    }

    set.result
        .iter()
        .filter(|r| r.kind == RECTANGLE_TYPE)
        .filter_map(|item| {
            let sizes = texts.get(item.id.as_str()).cloned().unwrap_or_default();
            let region = parse_region(item, sizes);
            if region.is_none() {
                debug!("Ignoring incomplete region '{}'", item.id);
            }
            region
        })
        .collect()
}

/// Indexes the first annotation set of each task by image reference.
pub fn index_regions(tasks: &[ExportTask]) -> RegionIndex {
    let mut index = RegionIndex::new();
    for task in tasks {
        let regions = task
            .annotations
            .first()
            .map(parse_annotation_set)
            .unwrap_or_default();
        index
            .entry(task.data.image.clone())
            .or_default()
            .extend(regions);
    }
    index
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn rect(id: &str, x: f64, y: f64, w: f64, h: f64, tag: &str) -> Value {
        json!({
            "id": id,
            "type": "rectanglelabels",
            "from_name": "label",
            "to_name": "image",
            "original_width": 2000,
            "original_height": 1000,
            "value": {"x": x, "y": y, "width": w, "height": h, "rotation": 0, "rectanglelabels": [tag]}
        })
    }

    pub(crate) fn text(id: &str, value: &str) -> Value {
        json!({
            "id": id,
            "type": "textarea",
            "from_name": "size",
            "to_name": "image",
            "original_width": 2000,
            "original_height": 1000,
            "value": {"x": 0, "y": 0, "width": 1, "height": 1, "text": [value]}
        })
    }

    pub(crate) fn task(image: &str, holes: Vec<Value>, views: Vec<Value>) -> Value {
        json!({
            "id": 7,
            "data": {"image": image},
            "annotations": [{"id": 1, "result": holes}, {"id": 2, "result": views}]
        })
    }

    #[test]
    fn test_percent_geometry_becomes_pixels() -> HoleResult<()> {
        let tasks: Vec<ExportTask> = serde_json::from_value(json!([task(
            "s3://bucket/a.png",
            vec![rect("h1", 10.0, 20.0, 5.0, 10.0, "圆孔"), text("h1", "Φ18")],
            vec![rect("v1", 0.0, 0.0, 50.0, 50.0, "ExpandView")],
        )]))?;
        let index = index_regions(&split_export(&tasks).holes);
        let regions = &index["s3://bucket/a.png"];
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BBox::new(200, 200, 300, 300));
        assert_eq!(regions[0].tag, "圆孔");
        assert_eq!(regions[0].label_type, "rectanglelabels");
        assert_eq!(regions[0].size(), Some("Φ18"));
        Ok(())
    }

    #[test]
    fn test_rotated_region_keeps_unrotated_box() -> HoleResult<()> {
        let mut value = rect("h1", 10.0, 20.0, 5.0, 10.0, "圆孔");
        value["value"]["rotation"] = json!(30);
        let item: ResultItem = serde_json::from_value(value)?;
        let region = parse_region(&item, Vec::new()).ok_or_else(|| {
            HoleError::malformed_annotation("h1", "rotated region was not parsed")
        })?;
        assert_eq!(region.rotation, 30.0);
        assert_eq!(region.bbox, BBox::new(200, 200, 300, 300));
        Ok(())
    }

    #[test]
    fn test_split_keeps_one_set_each() -> HoleResult<()> {
        let task: ExportTask = serde_json::from_value(task(
            "a.png",
            vec![rect("h1", 1.0, 1.0, 1.0, 1.0, "腰孔")],
            vec![rect("v1", 0.0, 0.0, 50.0, 50.0, "ExpandView")],
        ))?;
        let (holes, views) = split_task(&task)?;
        assert_eq!(holes.annotations.len(), 1);
        assert_eq!(views.annotations.len(), 1);
        assert_eq!(parse_annotation_set(&views.annotations[0])[0].tag, "ExpandView");
        assert_eq!(holes.extra.get("id"), Some(&json!(7)));
        Ok(())
    }

    #[test]
    fn test_single_set_task_is_malformed() -> HoleResult<()> {
        let task: ExportTask = serde_json::from_value(json!({
            "data": {"image": "b.png"},
            "annotations": [{"result": []}]
        }))?;
        assert!(matches!(
            split_task(&task),
            Err(HoleError::MalformedAnnotation { .. })
        ));
        assert!(split_export(&[task]).holes.is_empty());
        Ok(())
    }

    #[test]
    fn test_region_to_hole() {
        let region = RegionAnnotation {
            bbox: BBox::new(1, 2, 3, 4),
            rotation: 0.0,
            label_type: RECTANGLE_TYPE.to_string(),
            tag: "方孔".to_string(),
            sizes: vec![" ".to_string(), "20x14".to_string()],
        };
        let hole = region.to_hole();
        assert_eq!(
            hole,
            Some(HoleAnnotation::new(HoleCategory::Rect, BBox::new(1, 2, 3, 4), "20x14"))
        );

        let view = RegionAnnotation {
            tag: "MainView".to_string(),
            ..region
        };
        assert!(view.to_hole().is_none());
        assert_eq!(view.to_view_region().kind, "MainView");
    }
}
