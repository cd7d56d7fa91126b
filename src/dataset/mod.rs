//! Training-set construction from Label Studio exports.
//!
//! The `build` flow is:
//!
//! 1. [`prepare::prepare_export`] splits the export and selects usable sheets
//! 2. [`features::extract_features`] crops each sheet to its expanded view,
//!    resizes the crop and moves the holes into label space
//! 3. [`samples::build_samples`] assembles the original and rotated samples
//! 4. [`samples::write_samples`] writes `view.json` / `view_ex.json`

pub mod features;
pub mod label_studio;
pub mod prepare;
pub mod samples;

pub use features::{SheetFeatures, extract_features};
pub use label_studio::{ExportTask, RegionAnnotation, RegionIndex};
pub use prepare::{PreparedExport, prepare_export};
pub use samples::{SampleSet, build_samples, write_samples};

use crate::config::DatasetConfig;
use holedet_core::core::HoleResult;
use holedet_vl::prompt::load_prompt;
use std::path::Path;
use tracing::info;

/// Runs the whole pipeline; source sheets are expected under the configured
/// images directory.
pub fn build_dataset(
    export_path: &Path,
    save_dir: &Path,
    config: &DatasetConfig,
) -> HoleResult<SampleSet> {
    let prompt = load_prompt(config.prompt_path.as_deref())?;
    let prepared = prepare_export(export_path, save_dir)?;
    let sheets = extract_features(&prepared, save_dir, config)?;
    let set = build_samples(&sheets, save_dir, &prompt, config)?;
    write_samples(&set, save_dir, config)?;
    info!(
        "Built {} + {} samples in {} mode",
        set.original.len(),
        set.rotated.len(),
        config.mode
    );
    Ok(set)
}
