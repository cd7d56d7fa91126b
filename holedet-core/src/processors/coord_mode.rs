//! Label coordinate spaces understood by the target models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::geometry::BBox;
use super::normalize::{denormalize, normalize, to_resized_pixels};
use super::rotate::{rotate_cw_90, rotate_cw_90_pixels};
use crate::core::{HoleError, HoleResult};

/// Which coordinate space boxes are written in.
///
/// * `Qwen3` - integers on the 0-1000 grid, independent of resolution.
/// * `Qwen2` - absolute pixels of the resized training image (legacy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordMode {
    Qwen2,
    #[default]
    Qwen3,
}

impl CoordMode {
    /// Converts a crop-local pixel box into this label space.
    ///
    /// `crop_*` is the size of the cropped view, `resized_*` the size the crop
    /// is saved at.
    pub fn to_label_space(
        &self,
        box_px: BBox,
        crop_height: u32,
        crop_width: u32,
        resized_height: u32,
        resized_width: u32,
    ) -> HoleResult<BBox> {
        match self {
            CoordMode::Qwen3 => normalize(box_px, crop_height, crop_width),
            CoordMode::Qwen2 => to_resized_pixels(
                box_px,
                crop_height,
                crop_width,
                resized_height,
                resized_width,
            ),
        }
    }

    /// Rotates a label box 90 degrees clockwise along with its image.
    pub fn rotate_cw_90(
        &self,
        label: BBox,
        image_height: u32,
        image_width: u32,
    ) -> HoleResult<BBox> {
        match self {
            CoordMode::Qwen3 => rotate_cw_90(label, image_height, image_width),
            CoordMode::Qwen2 => Ok(rotate_cw_90_pixels(label, image_height)),
        }
    }

    /// Maps a label box back to pixels of an image of the given size.
    pub fn to_pixels(&self, label: BBox, image_height: u32, image_width: u32) -> HoleResult<BBox> {
        match self {
            CoordMode::Qwen3 => denormalize(label, image_height, image_width),
            CoordMode::Qwen2 => Ok(label),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoordMode::Qwen2 => "qwen2",
            CoordMode::Qwen3 => "qwen3",
        }
    }
}

impl FromStr for CoordMode {
    type Err = HoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qwen2" | "qwen2.5" | "pixel" => Ok(CoordMode::Qwen2),
            "qwen3" | "normalized" => Ok(CoordMode::Qwen3),
            other => Err(HoleError::invalid_input(format!(
                "unknown coordinate mode '{other}', expected qwen2 or qwen3"
            ))),
        }
    }
}

impl std::fmt::Display for CoordMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() -> HoleResult<()> {
        assert_eq!("qwen3".parse::<CoordMode>()?, CoordMode::Qwen3);
        assert_eq!("Qwen2".parse::<CoordMode>()?, CoordMode::Qwen2);
        assert!("yolo".parse::<CoordMode>().is_err());
        Ok(())
    }

    #[test]
    fn test_label_space_per_mode() -> HoleResult<()> {
        let hole = BBox::new(100, 100, 300, 200);
        let norm = CoordMode::Qwen3.to_label_space(hole, 1000, 2000, 992, 1984)?;
        assert_eq!(norm, BBox::new(50, 100, 150, 200));
        let px = CoordMode::Qwen2.to_label_space(hole, 1000, 2000, 992, 1984)?;
        assert_eq!(px, BBox::new(99, 99, 298, 198));
        Ok(())
    }

    #[test]
    fn test_to_pixels_per_mode() -> HoleResult<()> {
        let b = BBox::new(50, 100, 150, 200);
        assert_eq!(
            CoordMode::Qwen3.to_pixels(b, 1000, 2000)?,
            BBox::new(100, 100, 300, 200)
        );
        assert_eq!(CoordMode::Qwen2.to_pixels(b, 1000, 2000)?, b);
        Ok(())
    }

    #[test]
    fn test_serde_lowercase() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&CoordMode::Qwen2)?, "\"qwen2\"");
        Ok(())
    }
}
