//! Box transforms for 90 degree clockwise image rotation.

use super::geometry::BBox;
use super::normalize::{denormalize, normalize};
use crate::core::HoleResult;

/// Rotates a normalized box together with its image, 90 degrees clockwise.
///
/// `image_height` and `image_width` are the pixel dimensions of the image the
/// box currently belongs to. The box is denormalized, each corner goes through
/// `(x, y) -> (H - y, x)`, and the result is renormalized against the rotated
/// image, whose height is the old width and whose width is the old height.
/// Corners are re-sorted so `x1 < x2` and `y1 < y2` still hold.
pub fn rotate_cw_90(box_norm: BBox, image_height: u32, image_width: u32) -> HoleResult<BBox> {
    let px = denormalize(box_norm, image_height, image_width)?;
    let rotated = rotate_cw_90_pixels(px, image_height);
    normalize(rotated, image_width, image_height)
}

/// Rotates a pixel box 90 degrees clockwise inside an image of height `image_height`.
pub fn rotate_cw_90_pixels(box_px: BBox, image_height: u32) -> BBox {
    let h = image_height as i32;
    BBox::new(h - box_px.y2, box_px.x1, h - box_px.y1, box_px.x2).sorted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_wide_drawing() -> HoleResult<()> {
        // 2000x1000 drawing, hole at pixels (100,100)-(300,200)
        let norm = BBox::new(50, 100, 150, 200);
        let rotated = rotate_cw_90(norm, 1000, 2000)?;
        assert_eq!(rotated, BBox::new(800, 50, 900, 150));
        assert!(rotated.is_valid());
        Ok(())
    }

    #[test]
    fn test_four_rotations_return_home() -> HoleResult<()> {
        let dims = [(1000u32, 2000u32), (2000, 1000)];
        for start in [
            BBox::new(50, 100, 150, 200),
            BBox::new(0, 0, 1000, 1000),
            BBox::new(333, 17, 661, 999),
        ] {
            let mut b = start;
            for step in 0..4 {
                let (h, w) = dims[step % 2];
                b = rotate_cw_90(b, h, w)?;
                assert!(b.x1 <= b.x2 && b.y1 <= b.y2);
            }
            for (a, r) in start.to_array().iter().zip(b.to_array()) {
                assert!((a - r).abs() <= 1, "{start} drifted to {b}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_two_rotations_are_a_half_turn() -> HoleResult<()> {
        let b = rotate_cw_90(rotate_cw_90(BBox::new(50, 100, 150, 200), 1000, 2000)?, 2000, 1000)?;
        assert_eq!(b, BBox::new(850, 800, 950, 900));
        Ok(())
    }

    #[test]
    fn test_rotate_pixels() {
        let b = rotate_cw_90_pixels(BBox::new(100, 100, 300, 200), 1000);
        assert_eq!(b, BBox::new(800, 100, 900, 300));
    }
}
