//! Domain types: hole categories and annotations, view regions, label schema.

pub mod hole;
pub mod labels;
pub mod region;

pub use hole::{CATEGORY_ALIASES, HoleAnnotation, HoleCategory, extract_size_text};
pub use labels::{LabelEntry, LabelStats, assemble, render_labels};
pub use region::{ViewRegion, first_expand_view};
