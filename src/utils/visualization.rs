//! Visualization utilities for hole-detection QA.
//!
//! Boxes are drawn per category with a fixed color for each of the four hole
//! classes, and the category name is printed on a translucent dark strip
//! above every box.
//!
//! # Examples
//!
//! ```rust
//! use holedet::utils::visualization::{VisualizationConfig, draw_hole_boxes};
//! use holedet_core::processors::BBox;
//! use image::RgbImage;
//!
//! let mut img = RgbImage::new(64, 64);
//! let config = VisualizationConfig::default();
//! let groups = vec![("圆孔".to_string(), vec![BBox::new(8, 8, 32, 32)])];
//! draw_hole_boxes(&mut img, &groups, &config);
//! ```

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use holedet_core::core::{HoleError, HoleResult};
use holedet_core::domain::HoleCategory;
use holedet_core::processors::BBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info};

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const STRIP_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const STRIP_ALPHA: u8 = 180;

/// Colors for categories outside the four hole classes, picked by name.
const FALLBACK_COLORS: [Rgb<u8>; 6] = [
    Rgb([255, 0, 255]),
    Rgb([0, 255, 255]),
    Rgb([255, 128, 0]),
    Rgb([128, 0, 255]),
    Rgb([0, 128, 128]),
    Rgb([128, 128, 0]),
];

/// Box color of a category name.
pub fn category_color(category: &str) -> Rgb<u8> {
    match HoleCategory::from_label(category) {
        Some(HoleCategory::Circle) => Rgb([255, 0, 0]),
        Some(HoleCategory::Slot) => Rgb([255, 255, 0]),
        Some(HoleCategory::Rect) => Rgb([0, 0, 255]),
        Some(HoleCategory::Thread) => Rgb([0, 255, 0]),
        None => {
            let hash = category
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            FALLBACK_COLORS[hash % FALLBACK_COLORS.len()]
        }
    }
}

/// Configuration for QA rendering.
pub struct VisualizationConfig {
    /// The font to use for labels. If None, only boxes are drawn.
    pub font: Option<FontVec>,

    /// Label font size in pixels. Defaults to 28.
    pub font_scale: f32,

    /// Box outline width. Defaults to 4.
    pub box_width: i32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 28.0,
            box_width: 4,
        }
    }
}

impl VisualizationConfig {
    /// Creates a config with a font loaded from `font_path`.
    pub fn with_font_path(font_path: &Path) -> HoleResult<Self> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| {
            HoleError::invalid_input(format!("failed to parse font file: {}", font_path.display()))
        })?;

        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Loads the first usable system font, preferring ones with CJK glyphs.
    ///
    /// Falls back to the default configuration (no labels) when none is found.
    pub fn with_system_font() -> Self {
        let font_paths = [
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/System/Library/Fonts/PingFang.ttc",
            "C:\\Windows\\Fonts\\msyh.ttc",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path)
                && let Ok(font) = FontVec::try_from_vec(font_data)
            {
                info!("Loaded system font: {}", path);
                return Self {
                    font: Some(font),
                    ..Self::default()
                };
            }
        }

        debug!("No system font found, labels will be skipped");
        Self::default()
    }
}

/// Draws every group of boxes onto `img`.
///
/// Boxes are pixel coordinates of `img`; boxes that do not overlap the image
/// are skipped.
pub fn draw_hole_boxes(
    img: &mut RgbImage,
    groups: &[(String, Vec<BBox>)],
    config: &VisualizationConfig,
) {
    for (category, boxes) in groups {
        let color = category_color(category);
        for bbox in boxes {
            let Some(rect) = clip_to_image(bbox, img.width(), img.height()) else {
                debug!("Box {} of '{}' lies outside the image", bbox, category);
                continue;
            };
            draw_thick_rect(img, rect, color, config.box_width);
            if let Some(font) = &config.font {
                draw_label(img, rect, category, font, config.font_scale);
            }
        }
    }
}

fn clip_to_image(bbox: &BBox, width: u32, height: u32) -> Option<Rect> {
    let b = bbox.sorted();
    let x1 = b.x1.max(0);
    let y1 = b.y1.max(0);
    let x2 = b.x2.min(width as i32 - 1);
    let y2 = b.y2.min(height as i32 - 1);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Rect::at(x1, y1).of_size((x2 - x1) as u32, (y2 - y1) as u32))
}

fn draw_thick_rect(img: &mut RgbImage, rect: Rect, color: Rgb<u8>, thickness: i32) {
    for t in 0..thickness {
        let w = rect.width() as i32 - 2 * t;
        let h = rect.height() as i32 - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        let inner = Rect::at(rect.left() + t, rect.top() + t).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, inner, color);
    }
}

/// Prints `text` on a translucent strip sitting on top of `rect`, or just
/// inside it when there is no room above.
fn draw_label(img: &mut RgbImage, rect: Rect, text: &str, font: &FontVec, font_scale: f32) {
    let text_width = measure_text_width(text, font, font_scale).ceil() as i32;
    let text_height = font_scale.ceil() as i32;
    if text_width <= 0 {
        return;
    }

    let x = rect.left();
    let y = if rect.top() >= text_height {
        rect.top() - text_height
    } else {
        rect.top()
    };
    blend_rect(img, x, y, text_width, text_height, STRIP_COLOR, STRIP_ALPHA);
    draw_text_mut(img, TEXT_COLOR, x, y, font_scale, font, text);
}

fn blend_rect(img: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>, alpha: u8) {
    let a = u16::from(alpha);
    let x_end = (x + w).min(img.width() as i32);
    let y_end = (y + h).min(img.height() as i32);
    for py in y.max(0)..y_end {
        for px in x.max(0)..x_end {
            let pixel = img.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                let blended = (u16::from(color[c]) * a + u16::from(pixel[c]) * (255 - a)) / 255;
                pixel[c] = blended as u8;
            }
        }
    }
}

fn measure_text_width(text: &str, font: &FontVec, scale: f32) -> f32 {
    let scaled_font = font.as_scaled(PxScale::from(scale));
    text.chars()
        .map(|ch| scaled_font.h_advance(scaled_font.glyph_id(ch)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_colors() {
        assert_eq!(category_color("圆孔"), Rgb([255, 0, 0]));
        assert_eq!(category_color("腰孔"), Rgb([255, 255, 0]));
        assert_eq!(category_color("矩形孔"), Rgb([0, 0, 255]));
        assert_eq!(category_color("螺纹孔"), Rgb([0, 255, 0]));
        assert_eq!(category_color("方孔"), Rgb([0, 0, 255]));
        assert_eq!(category_color("沉孔"), category_color("沉孔"));
        assert!(FALLBACK_COLORS.contains(&category_color("沉孔")));
    }

    #[test]
    fn test_draw_hole_boxes_outlines_box() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        let groups = vec![
            ("螺纹孔".to_string(), vec![BBox::new(10, 10, 50, 50)]),
            ("腰孔".to_string(), vec![BBox::new(500, 500, 600, 600)]),
        ];
        draw_hole_boxes(&mut img, &groups, &VisualizationConfig::default());

        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 255, 0]));
        assert_eq!(*img.get_pixel(13, 30), Rgb([0, 255, 0]));
        assert_eq!(*img.get_pixel(30, 30), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(99, 99), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_blend_rect_darkens() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        blend_rect(&mut img, -2, -2, 4, 4, STRIP_COLOR, STRIP_ALPHA);
        assert_eq!(*img.get_pixel(0, 0), Rgb([75, 75, 75]));
        assert_eq!(*img.get_pixel(2, 2), Rgb([255, 255, 255]));
    }
}
