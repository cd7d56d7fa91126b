//! Mapping between pixel boxes and the normalized 0-1000 label grid.

use super::geometry::BBox;
use super::resize::round_half_even;
use crate::core::constants::NORMALIZED_GRID;
use crate::core::{HoleError, HoleResult};

fn check_dims(image_height: u32, image_width: u32) -> HoleResult<()> {
    if image_height == 0 || image_width == 0 {
        return Err(HoleError::invalid_dimension(format!(
            "image dimensions must be > 0, got {image_height}x{image_width}"
        )));
    }
    Ok(())
}

#[inline]
fn to_grid(value: i32, dimension: u32) -> i32 {
    let scaled = round_half_even(value as f64 / dimension as f64 * NORMALIZED_GRID as f64);
    (scaled as i32).clamp(0, NORMALIZED_GRID)
}

#[inline]
fn from_grid(value: i32, dimension: u32) -> i32 {
    round_half_even(value as f64 / NORMALIZED_GRID as f64 * dimension as f64) as i32
}

/// Maps a pixel box onto the 0-1000 grid of an image of the given size.
///
/// x coordinates are divided by the width and y coordinates by the height.
/// Results are clamped to `[0, 1000]`, so boxes that spill slightly outside
/// the image still produce valid labels.
pub fn normalize(box_px: BBox, image_height: u32, image_width: u32) -> HoleResult<BBox> {
    check_dims(image_height, image_width)?;
    Ok(BBox::new(
        to_grid(box_px.x1, image_width),
        to_grid(box_px.y1, image_height),
        to_grid(box_px.x2, image_width),
        to_grid(box_px.y2, image_height),
    ))
}

/// Inverse of [`normalize`].
///
/// The pair is lossy: with sides of at least 1000 pixels,
/// `normalize(denormalize(b))` matches `b` within one unit per coordinate.
pub fn denormalize(box_norm: BBox, image_height: u32, image_width: u32) -> HoleResult<BBox> {
    check_dims(image_height, image_width)?;
    Ok(BBox::new(
        from_grid(box_norm.x1, image_width),
        from_grid(box_norm.y1, image_height),
        from_grid(box_norm.x2, image_width),
        from_grid(box_norm.y2, image_height),
    ))
}

/// Rescales a pixel box from an image of `orig` size to the resized image.
///
/// Coordinates are clamped to the last valid pixel of the resized image. This
/// is the label space of the legacy pixel mode.
pub fn to_resized_pixels(
    box_px: BBox,
    orig_height: u32,
    orig_width: u32,
    new_height: u32,
    new_width: u32,
) -> HoleResult<BBox> {
    check_dims(orig_height, orig_width)?;
    check_dims(new_height, new_width)?;
    let scale_w = new_width as f64 / orig_width as f64;
    let scale_h = new_height as f64 / orig_height as f64;
    let max_x = new_width as i32 - 1;
    let max_y = new_height as i32 - 1;
    let sx = |v: i32| (round_half_even(v as f64 * scale_w) as i32).clamp(0, max_x);
    let sy = |v: i32| (round_half_even(v as f64 * scale_h) as i32).clamp(0, max_y);
    Ok(BBox::new(
        sx(box_px.x1),
        sy(box_px.y1),
        sx(box_px.x2),
        sy(box_px.y2),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wide_drawing() -> HoleResult<()> {
        let b = normalize(BBox::new(100, 100, 300, 200), 1000, 2000)?;
        assert_eq!(b, BBox::new(50, 100, 150, 200));
        Ok(())
    }

    #[test]
    fn test_normalize_clamps_out_of_range() -> HoleResult<()> {
        let b = normalize(BBox::new(-5, -1, 2010, 1003), 1000, 2000)?;
        assert_eq!(b, BBox::new(0, 0, 1000, 1000));
        Ok(())
    }

    #[test]
    fn test_round_trip_within_one_unit() -> HoleResult<()> {
        for (h, w) in [(1000, 1000), (1000, 2000), (1216, 1984), (3008, 1472)] {
            for v in (0..=1000).step_by(37) {
                let b = BBox::new(v / 2, v / 3, v, v);
                let back = normalize(denormalize(b, h, w)?, h, w)?;
                for (a, r) in b.to_array().iter().zip(back.to_array()) {
                    assert!((a - r).abs() <= 1, "{b} -> {back} at {h}x{w}");
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        assert!(matches!(
            normalize(BBox::new(0, 0, 1, 1), 0, 10),
            Err(HoleError::InvalidDimension { .. })
        ));
        assert!(denormalize(BBox::new(0, 0, 1, 1), 10, 0).is_err());
    }

    #[test]
    fn test_to_resized_pixels_scales_and_clamps() -> HoleResult<()> {
        let b = to_resized_pixels(BBox::new(100, 50, 1000, 500), 500, 1000, 256, 512)?;
        assert_eq!(b, BBox::new(51, 26, 511, 255));
        Ok(())
    }
}
