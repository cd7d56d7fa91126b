//! Training samples: one per sheet plus one rotated copy.

use super::features::{SheetFeatures, TRAIN_DIR};
use crate::config::DatasetConfig;
use holedet_core::core::HoleResult;
use holedet_core::domain::{HoleAnnotation, LabelStats, assemble};
use holedet_core::utils::{load_image, rotate_cw_90, save_image};
use holedet_vl::TrainingSample;
use holedet_vl::chat::{write_json_array, write_jsonl};
use std::path::Path;
use tracing::info;

pub const ROTATED_DIR: &str = "train_data_ex";
pub const SAMPLES_FILE: &str = "view.json";
pub const ROTATED_SAMPLES_FILE: &str = "view_ex.json";

/// Samples of the original crops and of their rotated copies.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    pub original: Vec<TrainingSample>,
    pub rotated: Vec<TrainingSample>,
    pub stats: LabelStats,
}

/// Label boxes of `holes` after the crop is turned 90 degrees clockwise.
pub fn rotate_holes(
    holes: &[HoleAnnotation],
    height: u32,
    width: u32,
    config: &DatasetConfig,
) -> HoleResult<Vec<HoleAnnotation>> {
    holes
        .iter()
        .map(|h| -> HoleResult<HoleAnnotation> {
            Ok(h.with_bbox(config.mode.rotate_cw_90(h.bbox, height, width)?))
        })
        .collect()
}

/// Builds both samples of one sheet and writes its rotated crop.
pub fn build_sheet_samples(
    sheet: &SheetFeatures,
    save_dir: &Path,
    prompt: &str,
    config: &DatasetConfig,
) -> HoleResult<(TrainingSample, TrainingSample)> {
    let crop = load_image(&save_dir.join(TRAIN_DIR).join(&sheet.file_name))?;
    let (height, width) = (crop.height(), crop.width());
    save_image(
        &rotate_cw_90(&crop),
        &save_dir.join(ROTATED_DIR).join(&sheet.file_name),
    )?;

    let original = TrainingSample::new(
        prompt,
        &assemble(&sheet.holes),
        format!("{TRAIN_DIR}/{}", sheet.file_name),
    )?;
    let rotated_holes = rotate_holes(&sheet.holes, height, width, config)?;
    let rotated = TrainingSample::new(
        prompt,
        &assemble(&rotated_holes),
        format!("{ROTATED_DIR}/{}", sheet.file_name),
    )?;
    Ok((original, rotated))
}

pub fn build_samples(
    sheets: &[SheetFeatures],
    save_dir: &Path,
    prompt: &str,
    config: &DatasetConfig,
) -> HoleResult<SampleSet> {
    std::fs::create_dir_all(save_dir.join(ROTATED_DIR))?;
    let mut set = SampleSet::default();
    for sheet in sheets {
        let (original, rotated) = build_sheet_samples(sheet, save_dir, prompt, config)?;
        set.stats.record(&sheet.holes);
        set.original.push(original);
        set.rotated.push(rotated);
    }
    Ok(set)
}

/// Writes `view.json` and `view_ex.json`, plus their `.jsonl` forms when
/// enabled.
pub fn write_samples(set: &SampleSet, save_dir: &Path, config: &DatasetConfig) -> HoleResult<()> {
    for (name, samples) in [
        (SAMPLES_FILE, &set.original),
        (ROTATED_SAMPLES_FILE, &set.rotated),
    ] {
        let path = save_dir.join(name);
        write_json_array(&path, samples)?;
        if config.write_jsonl {
            write_jsonl(&path.with_extension("jsonl"), samples)?;
        }
        info!("Wrote {} samples to {}", samples.len(), path.display());
    }
    info!("Label statistics: {}", set.stats);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use holedet_core::domain::{HoleCategory, LabelEntry};
    use holedet_core::processors::BBox;
    use holedet_vl::chat::{read_json_array, read_jsonl};
    use image::{Rgb, RgbImage};

    fn sheet_on_disk(dir: &Path) -> HoleResult<SheetFeatures> {
        let train = dir.join(TRAIN_DIR);
        std::fs::create_dir_all(&train)?;
        RgbImage::from_pixel(2000, 1000, Rgb([0, 0, 0])).save(train.join("a.png"))?;
        Ok(SheetFeatures {
            file_name: "a.png".to_string(),
            height: 1000,
            width: 2000,
            holes: vec![HoleAnnotation::new(
                HoleCategory::Circle,
                BBox::new(50, 100, 150, 200),
                "Φ18mm",
            )],
        })
    }

    fn assistant_labels(sample: &TrainingSample) -> Vec<LabelEntry> {
        let content = sample.assistant_content().unwrap_or_default();
        let body = holedet_vl::extract_json_block(content).unwrap_or("[]");
        serde_json::from_str(body).unwrap_or_default()
    }

    #[test]
    fn test_rotated_sample_moves_boxes() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let sheet = sheet_on_disk(dir.path())?;
        let config = DatasetConfig::default();
        let set = build_samples(&[sheet], dir.path(), "prompt", &config)?;

        assert_eq!(set.original[0].image(), Some("train_data/a.png"));
        assert_eq!(set.rotated[0].image(), Some("train_data_ex/a.png"));

        let original = assistant_labels(&set.original[0]);
        assert_eq!(original.len(), 4);
        assert_eq!(original[0].bbox_2d, Some(BBox::new(50, 100, 150, 200)));
        assert_eq!(original[0].size, "18mm");
        assert!(original[1..].iter().all(LabelEntry::is_placeholder));

        let rotated = assistant_labels(&set.rotated[0]);
        assert_eq!(rotated[0].bbox_2d, Some(BBox::new(800, 50, 900, 150)));

        let rotated_img = load_image(&dir.path().join(ROTATED_DIR).join("a.png"))?;
        assert_eq!(rotated_img.dimensions(), (1000, 2000));
        assert_eq!(set.stats.count(HoleCategory::Circle), 1);
        Ok(())
    }

    #[test]
    fn test_write_samples_json_and_jsonl() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let sheet = sheet_on_disk(dir.path())?;
        let config = DatasetConfig::default();
        let set = build_samples(&[sheet], dir.path(), "prompt", &config)?;
        write_samples(&set, dir.path(), &config)?;

        let from_json = read_json_array(&dir.path().join(SAMPLES_FILE))?;
        let from_jsonl = read_jsonl(&dir.path().join("view.jsonl"))?;
        assert_eq!(from_json, set.original);
        assert_eq!(from_jsonl, set.original);
        assert_eq!(read_jsonl(&dir.path().join("view_ex.jsonl"))?, set.rotated);
        Ok(())
    }
}
