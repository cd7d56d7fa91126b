//! Image helpers shared by the dataset and QA pipelines.

pub mod image;

pub use image::{crop_to_region, dynamic_to_rgb, load_image, resize_to, rotate_cw_90, save_image};
