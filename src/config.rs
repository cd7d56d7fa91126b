//! Run configuration for the dataset builder and the downloader.
//!
//! Both configs deserialize from JSON with every field optional; missing
//! fields take their defaults. CLI flags are applied on top of a loaded file.

use holedet_core::core::constants::{
    DEFAULT_DOWNLOAD_RETRY, DEFAULT_DOWNLOAD_WORKERS, MAX_DOWNLOAD_WORKERS,
};
use holedet_core::core::{ConfigError, ConfigValidator, HoleResult, ResizeConfig};
use holedet_core::processors::CoordMode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reads a JSON config file and validates it.
pub fn load_config<T>(path: &Path) -> HoleResult<T>
where
    T: DeserializeOwned + ConfigValidator,
{
    let text = std::fs::read_to_string(path)?;
    let config: T = serde_json::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

/// Settings of the `build` pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Resize planner constraints.
    pub resize: ResizeConfig,
    /// Label coordinate space.
    pub mode: CoordMode,
    /// Replaces the built-in detection prompt when set.
    pub prompt_path: Option<PathBuf>,
    /// Directory holding the downloaded source sheets. Relative paths are
    /// resolved against the save directory; defaults to `images`.
    pub images_dir: Option<PathBuf>,
    /// Also write `view.jsonl` / `view_ex.jsonl`.
    pub write_jsonl: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            resize: ResizeConfig::default(),
            mode: CoordMode::default(),
            prompt_path: None,
            images_dir: None,
            write_jsonl: true,
        }
    }
}

impl DatasetConfig {
    pub fn images_dir(&self, save_dir: &Path) -> PathBuf {
        match &self.images_dir {
            Some(dir) => save_dir.join(dir),
            None => save_dir.join("images"),
        }
    }
}

impl ConfigValidator for DatasetConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.resize.validate()?;
        if let Some(path) = &self.prompt_path
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::InvalidConfig {
                message: "prompt_path must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Settings of the bounded download pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub workers: usize,
    /// Attempts per item, including the first.
    pub retry: usize,
    /// File failed items are appended to.
    pub failure_log: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_DOWNLOAD_WORKERS,
            retry: DEFAULT_DOWNLOAD_RETRY,
            failure_log: PathBuf::from("failed.txt"),
        }
    }
}

impl ConfigValidator for DownloadConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_count_with_limit("workers", self.workers, MAX_DOWNLOAD_WORKERS)?;
        self.validate_count("retry", self.retry)
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holedet_core::core::HoleError;

    #[test]
    fn test_partial_json_takes_defaults() -> HoleResult<()> {
        let config: DatasetConfig =
            serde_json::from_str(r#"{"mode": "qwen2", "resize": {"factor": 28}}"#)?;
        assert_eq!(config.mode, CoordMode::Qwen2);
        assert_eq!(config.resize.factor, 28);
        assert_eq!(config.resize.max_pixels, ResizeConfig::default().max_pixels);
        assert!(config.validate().is_ok());
        Ok(())
    }

    #[test]
    fn test_images_dir_resolution() {
        let mut config = DatasetConfig::get_defaults();
        assert!(config.write_jsonl);
        assert_eq!(config.images_dir(Path::new("/data")), PathBuf::from("/data/images"));
        config.images_dir = Some(PathBuf::from("/mnt/sheets"));
        assert_eq!(config.images_dir(Path::new("/data")), PathBuf::from("/mnt/sheets"));
    }

    #[test]
    fn test_download_config_validation() {
        assert!(DownloadConfig::default().validate().is_ok());
        let zero = DownloadConfig {
            workers: 0,
            ..DownloadConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroCount { field: "workers" })));
        let huge = DownloadConfig {
            workers: MAX_DOWNLOAD_WORKERS + 1,
            ..DownloadConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::ResourceLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_load_config_rejects_invalid_values() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("download.json");
        std::fs::write(&path, r#"{"retry": 0}"#)?;
        let result = load_config::<DownloadConfig>(&path);
        assert!(matches!(result, Err(HoleError::ConfigError { .. })));
        Ok(())
    }
}
