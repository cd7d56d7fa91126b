//! Geometric processors: resize planning, box normalization and rotation.

pub mod coord_mode;
pub mod geometry;
pub mod normalize;
pub mod resize;
pub mod rotate;

pub use coord_mode::CoordMode;
pub use geometry::BBox;
pub use normalize::{denormalize, normalize, to_resized_pixels};
pub use resize::{plan_resize, plan_resize_with, round_half_even};
pub use rotate::{rotate_cw_90, rotate_cw_90_pixels};
