//! Splitting an export and selecting the sheets that can be trained on.

use super::label_studio::{
    RegionAnnotation, RegionIndex, index_regions, load_export, split_export, write_export,
};
use holedet_core::core::constants::EXPAND_VIEW_TAG;
use holedet_core::core::{HoleError, HoleResult};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

pub const HOLES_FILE: &str = "label_holes.json";
pub const VIEWS_FILE: &str = "label_views.json";
pub const DOWNLOAD_LIST_FILE: &str = "download_list.txt";

/// Parsed regions of an export and the sheets that passed the checks.
#[derive(Debug, Clone, Default)]
pub struct PreparedExport {
    pub views: RegionIndex,
    pub holes: RegionIndex,
    /// Image references of usable sheets, sorted.
    pub download_list: Vec<String>,
}

impl PreparedExport {
    pub fn views_of(&self, image: &str) -> &[RegionAnnotation] {
        self.views.get(image).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn holes_of(&self, image: &str) -> &[RegionAnnotation] {
        self.holes.get(image).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Checks that a sheet has an expanded view and that every hole has a size.
pub fn check_record(
    image: &str,
    views: &[RegionAnnotation],
    holes: &[RegionAnnotation],
) -> HoleResult<()> {
    if !views.iter().any(|v| v.tag == EXPAND_VIEW_TAG) {
        return Err(HoleError::malformed_annotation(
            image,
            "no ExpandView region",
        ));
    }
    let unsized_holes = holes.iter().filter(|h| h.size().is_none()).count();
    if unsized_holes > 0 {
        return Err(HoleError::malformed_annotation(
            image,
            format!("{unsized_holes} hole(s) without size"),
        ));
    }
    Ok(())
}

/// Keeps the sheets present in both indexes that pass [`check_record`].
pub fn select_records(views: &RegionIndex, holes: &RegionIndex) -> Vec<String> {
    views
        .iter()
        .filter_map(|(image, view_regions)| {
            let hole_regions = holes.get(image)?;
            match check_record(image, view_regions, hole_regions) {
                Ok(()) => Some(image.clone()),
                Err(e) => {
                    warn!("Excluding sheet: {}", e);
                    None
                }
            }
        })
        .collect()
}

pub fn write_download_list(path: &Path, urls: &[String]) -> HoleResult<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for url in urls {
        writeln!(file, "{url}")?;
    }
    file.flush()?;
    Ok(())
}

/// Reads a download list, skipping blank lines.
pub fn read_download_list(path: &Path) -> HoleResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Splits the export at `export_path` into `label_holes.json` and
/// `label_views.json` under `save_dir`, parses both, and writes the usable
/// sheets to `download_list.txt`.
pub fn prepare_export(export_path: &Path, save_dir: &Path) -> HoleResult<PreparedExport> {
    std::fs::create_dir_all(save_dir)?;
    let tasks = load_export(export_path)?;
    let split = split_export(&tasks);

    write_export(&save_dir.join(HOLES_FILE), &split.holes)?;
    write_export(&save_dir.join(VIEWS_FILE), &split.views)?;

    let views = index_regions(&split.views);
    let holes = index_regions(&split.holes);
    let download_list = select_records(&views, &holes);
    write_download_list(&save_dir.join(DOWNLOAD_LIST_FILE), &download_list)?;

    info!(
        "{} of {} sheets usable for training",
        download_list.len(),
        tasks.len()
    );
    Ok(PreparedExport {
        views,
        holes,
        download_list,
    })
}
