//! Utility functions for loading, cropping, resizing and saving images.

use crate::core::{HoleError, HoleResult};
use crate::processors::BBox;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `HoleError::ImageLoad` if the image cannot be opened or decoded.
pub fn load_image(path: &Path) -> HoleResult<RgbImage> {
    let img = image::open(path).map_err(HoleError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Cuts `region` out of `img`.
///
/// Parts of the region outside the image come out black, so the crop always
/// has the region's size and crop-local coordinates stay aligned with it.
pub fn crop_to_region(img: &RgbImage, region: &BBox) -> HoleResult<RgbImage> {
    let region = region.sorted();
    if !region.is_valid() {
        return Err(HoleError::invalid_dimension(format!(
            "crop region {region} is empty"
        )));
    }
    let (w, h) = (region.width() as u32, region.height() as u32);

    let inside = region.x1 >= 0
        && region.y1 >= 0
        && region.x2 as u32 <= img.width()
        && region.y2 as u32 <= img.height();
    if inside {
        return Ok(imageops::crop_imm(img, region.x1 as u32, region.y1 as u32, w, h).to_image());
    }

    let mut canvas = RgbImage::new(w, h);
    imageops::overlay(&mut canvas, img, -(region.x1 as i64), -(region.y1 as i64));
    Ok(canvas)
}

/// Resizes to exactly `height` x `width` with a bicubic filter, returning the
/// input unchanged when it already has that size.
pub fn resize_to(img: RgbImage, height: u32, width: u32) -> RgbImage {
    if img.height() == height && img.width() == width {
        return img;
    }
    imageops::resize(&img, width, height, FilterType::CatmullRom)
}

/// Rotates an image 90 degrees clockwise; the output is `height` wide.
pub fn rotate_cw_90(img: &RgbImage) -> RgbImage {
    imageops::rotate90(img)
}

/// Saves an image, creating the parent directory when needed.
pub fn save_image(img: &RgbImage, path: &Path) -> HoleResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)
        .map_err(|e| HoleError::export_error(format!("saving {}", path.display()), e))
}
