//! The model boundary: a handle that turns an image into a raw response.

use holedet_core::core::{HoleError, HoleResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A loaded hole detector.
///
/// Implementations own whatever model state they need. Callers create one
/// handle, pass it by reference to every pass that needs it, and drop it when
/// done; nothing is loaded globally.
pub trait HoleDetector {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs detection on one image and returns the raw response text.
    fn detect(&self, image_path: &Path, prompt: &str) -> HoleResult<String>;
}

/// Replays responses stored as `<image stem>.txt` in a directory.
///
/// This is the format the QA pass dumps raw responses in, so a folder of
/// earlier results can be re-rendered without the model.
#[derive(Debug, Clone)]
pub struct ResponseArchive {
    dir: PathBuf,
}

impl ResponseArchive {
    pub fn open(dir: impl Into<PathBuf>) -> HoleResult<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(HoleError::invalid_input(format!(
                "response directory not found: {}",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn response_path(&self, image_path: &Path) -> PathBuf {
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.dir.join(format!("{stem}.txt"))
    }
}

impl HoleDetector for ResponseArchive {
    fn name(&self) -> &str {
        "response-archive"
    }

    fn detect(&self, image_path: &Path, _prompt: &str) -> HoleResult<String> {
        let path = self.response_path(image_path);
        debug!("Replaying {}", path.display());
        Ok(std::fs::read_to_string(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_replays_by_stem() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("sheet_01.txt"), "```json\n[]\n```")?;
        let archive = ResponseArchive::open(dir.path())?;
        let text = archive.detect(Path::new("/imgs/sheet_01.png"), "")?;
        assert_eq!(text, "```json\n[]\n```");
        assert!(archive.detect(Path::new("missing.png"), "").is_err());
        Ok(())
    }

    #[test]
    fn test_archive_requires_directory() {
        assert!(ResponseArchive::open("/definitely/not/here").is_err());
    }
}
