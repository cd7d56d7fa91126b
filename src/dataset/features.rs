//! Cutting the expanded view out of each sheet and moving its holes into
//! label space.

use super::label_studio::RegionAnnotation;
use super::prepare::PreparedExport;
use crate::config::DatasetConfig;
use holedet_core::core::{HoleError, HoleResult};
use holedet_core::domain::{HoleAnnotation, ViewRegion, first_expand_view};
use holedet_core::processors::plan_resize_with;
use holedet_core::utils::{crop_to_region, load_image, resize_to, save_image};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const TRAIN_DIR: &str = "train_data";

/// The training crop of one sheet and its holes in label space.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFeatures {
    /// File name shared by the source sheet and its training crops.
    pub file_name: String,
    /// Size of the saved crop.
    pub height: u32,
    pub width: u32,
    pub holes: Vec<HoleAnnotation>,
}

/// Last path segment of a URL or path.
pub fn file_name_of(image_ref: &str) -> &str {
    image_ref
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(image_ref)
}

/// Moves the holes inside `view` into label space of a crop that is saved at
/// `resized_height` x `resized_width`.
///
/// Holes that leave the view, have an unknown tag, or whose box is empty
/// before or after the conversion are dropped.
pub fn holes_in_view(
    holes: &[RegionAnnotation],
    view: &ViewRegion,
    resized_height: u32,
    resized_width: u32,
    config: &DatasetConfig,
) -> HoleResult<Vec<HoleAnnotation>> {
    let crop_height = view.bbox.height() as u32;
    let crop_width = view.bbox.width() as u32;

    let mut out = Vec::with_capacity(holes.len());
    for region in holes {
        let Some(hole) = region.to_hole() else {
            warn!("Skipping region with unknown tag '{}'", region.tag);
            continue;
        };
        if !hole.bbox.is_valid() {
            warn!("Skipping degenerate {} box {}", hole.category, hole.bbox);
            continue;
        }
        if !view.bbox.contains(&hole.bbox) {
            debug!("{} box {} lies outside the view", hole.category, hole.bbox);
            continue;
        }
        let local = hole.bbox.relative_to(&view.bbox);
        let label = config.mode.to_label_space(
            local,
            crop_height,
            crop_width,
            resized_height,
            resized_width,
        )?;
        if !label.is_valid() {
            warn!(
                "Dropping {} box {}: collapses to {} in label space",
                hole.category, hole.bbox, label
            );
            continue;
        }
        out.push(hole.with_bbox(label));
    }
    Ok(out)
}

/// Crops, resizes and saves one sheet, returning its labelled holes.
pub fn extract_sheet_features(
    image_ref: &str,
    views: &[RegionAnnotation],
    holes: &[RegionAnnotation],
    images_dir: &Path,
    train_dir: &Path,
    config: &DatasetConfig,
) -> HoleResult<SheetFeatures> {
    let view_regions: Vec<ViewRegion> = views.iter().map(|v| v.to_view_region()).collect();
    let expand_views = view_regions.iter().filter(|v| v.is_expand_view()).count();
    let view = first_expand_view(&view_regions)
        .ok_or_else(|| HoleError::malformed_annotation(image_ref, "no ExpandView region"))?;
    if expand_views > 1 {
        warn!("{image_ref}: {expand_views} ExpandView regions, using the first");
    }

    let file_name = file_name_of(image_ref).to_string();
    let sheet = load_image(&images_dir.join(&file_name))?;
    let crop = crop_to_region(&sheet, &view.bbox)?;
    let (crop_height, crop_width) = (crop.height(), crop.width());

    let (height, width) = plan_resize_with(crop_height, crop_width, &config.resize)?;
    let resized = resize_to(crop, height, width);
    save_image(&resized, &train_dir.join(&file_name))?;

    let holes = holes_in_view(holes, view, height, width, config)?;
    debug!(
        "{file_name}: view {}x{} -> {}x{}, {} holes",
        crop_width,
        crop_height,
        width,
        height,
        holes.len()
    );
    Ok(SheetFeatures {
        file_name,
        height,
        width,
        holes,
    })
}

/// Runs [`extract_sheet_features`] over every selected sheet.
///
/// Sheets that were never downloaded or whose annotations or dimensions
/// cannot be used are skipped; IO and decode failures stop the run.
pub fn extract_features(
    prepared: &PreparedExport,
    save_dir: &Path,
    config: &DatasetConfig,
) -> HoleResult<Vec<SheetFeatures>> {
    let images_dir = config.images_dir(save_dir);
    let train_dir: PathBuf = save_dir.join(TRAIN_DIR);
    std::fs::create_dir_all(&train_dir)?;

    let mut features = Vec::with_capacity(prepared.download_list.len());
    for image_ref in &prepared.download_list {
        let source = images_dir.join(file_name_of(image_ref));
        if !source.is_file() {
            warn!("Skipping {}: not downloaded", source.display());
            continue;
        }
        match extract_sheet_features(
            image_ref,
            prepared.views_of(image_ref),
            prepared.holes_of(image_ref),
            &images_dir,
            &train_dir,
            config,
        ) {
            Ok(f) => features.push(f),
            Err(e) if e.is_item_local() => warn!("Skipping {image_ref}: {e}"),
            Err(e) => return Err(e),
        }
    }
    info!(
        "Extracted {} of {} sheets into {}",
        features.len(),
        prepared.download_list.len(),
        train_dir.display()
    );
    Ok(features)
}
