//! Visual QA: render training labels or detector output onto the images.

use crate::utils::visualization::{VisualizationConfig, draw_hole_boxes};
use holedet_core::core::{HoleError, HoleResult};
use holedet_core::processors::{BBox, CoordMode};
use holedet_core::utils::{load_image, save_image};
use holedet_vl::chat::read_json_array;
use holedet_vl::{HoleDetector, group_by_category, parse_detections};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tif"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QaReport {
    pub rendered: usize,
    pub skipped: usize,
}

impl std::fmt::Display for QaReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rendered, {} skipped", self.rendered, self.skipped)
    }
}

/// Parses `response` and draws its boxes on the image at `image_path`,
/// saving the result to `output_path`.
pub fn render_response(
    image_path: &Path,
    response: &str,
    output_path: &Path,
    mode: CoordMode,
    config: &VisualizationConfig,
) -> HoleResult<usize> {
    let detections = parse_detections(response)?;
    let mut img = load_image(image_path)?;
    let (height, width) = (img.height(), img.width());

    let mut groups = Vec::new();
    let mut drawn = 0;
    for (category, boxes) in group_by_category(&detections) {
        let pixels = boxes
            .into_iter()
            .map(|b| mode.to_pixels(b, height, width))
            .collect::<HoleResult<Vec<BBox>>>()?;
        drawn += pixels.len();
        groups.push((category, pixels));
    }

    draw_hole_boxes(&mut img, &groups, config);
    save_image(&img, output_path)?;
    Ok(drawn)
}

fn output_name(path: &Path) -> HoleResult<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| HoleError::invalid_input(format!("no file name in {}", path.display())))
}

/// Renders the labels of a `view.json`-style sample file.
///
/// Image references are resolved against the file's directory.
pub fn check_training_set(
    data_path: &Path,
    out_dir: &Path,
    mode: CoordMode,
    config: &VisualizationConfig,
) -> HoleResult<QaReport> {
    let samples = read_json_array(data_path)?;
    let base = data_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(out_dir)?;

    let mut report = QaReport::default();
    for sample in &samples {
        let (Some(image), Some(answer)) = (sample.image(), sample.assistant_content()) else {
            warn!("Sample without image or answer, skipping");
            report.skipped += 1;
            continue;
        };
        let image_path = base.join(image);
        let output_path = out_dir.join(output_name(&image_path)?);
        match render_response(&image_path, answer, &output_path, mode, config) {
            Ok(_) => report.rendered += 1,
            Err(e) if e.is_item_local() => {
                warn!("{}: {e}", image_path.display());
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    info!("Checked {}: {report}", data_path.display());
    Ok(report)
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> HoleResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Runs `detector` over every image in `images_dir` and renders its answers.
///
/// The raw response of each rendered image is saved next to the rendering as
/// `<stem>.txt`. Images whose detector call fails or whose response has no
/// usable JSON block are logged and skipped.
pub fn evaluate(
    detector: &dyn HoleDetector,
    images_dir: &Path,
    prompt: &str,
    out_dir: &Path,
    mode: CoordMode,
    config: &VisualizationConfig,
) -> HoleResult<QaReport> {
    std::fs::create_dir_all(out_dir)?;
    let images = list_images(images_dir)?;
    info!(
        "Evaluating {} images with {}",
        images.len(),
        detector.name()
    );

    let mut report = QaReport::default();
    for image_path in &images {
        let response = match detector.detect(image_path, prompt) {
            Ok(response) => response,
            Err(e) => {
                warn!("{}: detector failed: {e}", image_path.display());
                report.skipped += 1;
                continue;
            }
        };
        let output_path = out_dir.join(output_name(image_path)?);
        match render_response(image_path, &response, &output_path, mode, config) {
            Ok(drawn) => {
                std::fs::write(output_path.with_extension("txt"), &response)?;
                info!("{}: {drawn} holes", image_path.display());
                report.rendered += 1;
            }
            Err(e) if e.is_item_local() => {
                warn!("{}: {e}", image_path.display());
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    info!("Evaluation finished: {report}");
    Ok(report)
}
