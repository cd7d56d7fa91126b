//! # holedet core
//!
//! Core types for preparing hole-detection training data from engineering
//! drawings.
//!
//! This crate provides:
//! - Error handling types
//! - Resize planning, box normalization and rotation
//! - Hole categories, annotations and the grouped label schema
//! - Image helpers for cropping, resizing and rotating drawings
//!
//! ## Modules
//!
//! * [`core`] - Errors, constants and configuration validation
//! * [`processors`] - Coordinate transforms
//! * [`domain`] - Hole and view types, label assembly
//! * [`utils`] - Image loading and manipulation
//!
//! ## Example
//!
//! ```rust
//! use holedet_core::prelude::*;
//!
//! # fn main() -> Result<(), HoleError> {
//! // a 2000x1000 drawing with one hole
//! let norm = normalize(BBox::new(100, 100, 300, 200), 1000, 2000)?;
//! assert_eq!(norm, BBox::new(50, 100, 150, 200));
//!
//! let rotated = rotate_cw_90(norm, 1000, 2000)?;
//! assert_eq!(rotated, BBox::new(800, 50, 900, 150));
//!
//! let labels = assemble(&[HoleAnnotation::new(HoleCategory::Circle, norm, "Φ18mm")]);
//! assert_eq!(labels.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{HoleError, HoleResult, ResizeConfig};
    pub use crate::domain::{
        HoleAnnotation, HoleCategory, LabelEntry, ViewRegion, assemble, extract_size_text,
    };
    pub use crate::processors::{
        BBox, CoordMode, denormalize, normalize, plan_resize, rotate_cw_90,
    };
    pub use crate::utils::load_image;
}
