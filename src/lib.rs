//! # holedet
//!
//! Training-data preparation and visual QA for a vision-language model that
//! finds holes in mechanical engineering drawings.
//!
//! ## Features
//!
//! - Label Studio export splitting and validation
//! - Expanded-view cropping, resize planning and label-space conversion
//! - Rotated augmentation with matching box rotation
//! - Chat-format `view.json` / `view_ex.json` output and JSONL conversion
//! - Bounded parallel download of source sheets with retries
//! - QA rendering of training labels and detector responses
//!
//! ## Modules
//!
//! * [`config`] - Dataset and download configuration
//! * [`dataset`] - Export parsing and training-set construction
//! * [`download`] - Parallel retrieval of source sheets
//! * [`qa`] - Rendering labels and detections for inspection
//! * [`utils`] - Logging setup and drawing helpers
//!
//! The geometric core lives in `holedet-core` and the model boundary in
//! `holedet-vl`; the prelude pulls in the common items of all three crates.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use holedet::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), HoleError> {
//! let config = DatasetConfig::default();
//! let set = build_dataset(Path::new("export.json"), Path::new("data"), &config)?;
//! println!("{}", set.stats);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod download;
#[cfg(feature = "visualization")]
pub mod qa;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{DatasetConfig, DownloadConfig};
    pub use crate::dataset::build_dataset;
    pub use crate::download::{DownloadReport, Downloader, SchemeFetcher};
    pub use holedet_core::prelude::*;
    pub use holedet_vl::{HoleDetector, ResponseArchive, TrainingSample, parse_detections};
}
