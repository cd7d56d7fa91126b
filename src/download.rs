//! Bounded parallel retrieval of source sheets.
//!
//! Every item is fetched by a [`Fetcher`] on a dedicated rayon pool. Failed
//! attempts are retried up to the configured count; items that still fail are
//! appended to the failure log and the run carries on. Completion order is
//! not defined.

use crate::config::DownloadConfig;
use holedet_core::core::{ConfigValidator, HoleError, HoleResult};
use rayon::prelude::*;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Copies one item into a directory.
pub trait Fetcher: Send + Sync {
    /// Fetches `source` into `out_dir`, returning the written path.
    fn fetch(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf>;
}

fn target_path(source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
    let name = source
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| HoleError::invalid_input(format!("no file name in '{source}'")))?;
    Ok(out_dir.join(name))
}

/// `s3://` objects through the `aws s3 cp` command.
#[derive(Debug, Clone, Default)]
pub struct AwsCliFetcher;

impl Fetcher for AwsCliFetcher {
    fn fetch(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
        let target = target_path(source, out_dir)?;
        let output = Command::new("aws")
            .args(["s3", "cp", source])
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()?;
        if output.status.success() {
            Ok(target)
        } else {
            Err(std::io::Error::other(String::from_utf8_lossy(&output.stderr).trim().to_string()).into())
        }
    }
}

/// `http(s)://` URLs through a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> HoleResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| HoleError::config_error(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
        let target = target_path(source, out_dir)?;
        let response = self
            .client
            .get(source)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(std::io::Error::other)?;
        let bytes = response.bytes().map_err(std::io::Error::other)?;
        std::fs::write(&target, &bytes)?;
        Ok(target)
    }
}

/// Plain filesystem paths.
#[derive(Debug, Clone, Default)]
pub struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn fetch(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
        let source = source.strip_prefix("file://").unwrap_or(source);
        let target = target_path(source, out_dir)?;
        if target.exists() && std::fs::canonicalize(source)? == std::fs::canonicalize(&target)? {
            debug!("{source} is already in place");
            return Ok(target);
        }
        std::fs::copy(source, &target)?;
        Ok(target)
    }
}

/// Picks a fetcher by URL scheme.
#[derive(Debug, Clone)]
pub struct SchemeFetcher {
    s3: AwsCliFetcher,
    http: HttpFetcher,
    local: LocalFetcher,
}

impl SchemeFetcher {
    pub fn new() -> HoleResult<Self> {
        Ok(Self {
            s3: AwsCliFetcher,
            http: HttpFetcher::new()?,
            local: LocalFetcher,
        })
    }
}

impl Fetcher for SchemeFetcher {
    fn fetch(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
        if source.starts_with("s3://") {
            self.s3.fetch(source, out_dir)
        } else if source.starts_with("http://") || source.starts_with("https://") {
            self.http.fetch(source, out_dir)
        } else {
            self.local.fetch(source, out_dir)
        }
    }
}

/// Append-only list of failed items, safe to share between workers.
#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, source: &str) -> HoleResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{source}")?;
        Ok(())
    }
}

/// Totals of a download run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl std::fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} downloaded, {} failed",
            self.succeeded, self.total, self.failed
        )
    }
}

pub struct Downloader<F: Fetcher> {
    fetcher: F,
    config: DownloadConfig,
}

impl<F: Fetcher> Downloader<F> {
    pub fn new(fetcher: F, config: DownloadConfig) -> HoleResult<Self> {
        config.validate()?;
        Ok(Self { fetcher, config })
    }

    /// Fetches one item, retrying up to the configured attempt count.
    pub fn fetch_with_retry(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
        let mut last_error = String::new();
        for attempt in 1..=self.config.retry {
            match self.fetcher.fetch(source, out_dir) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    debug!("Attempt {attempt}/{} for {source} failed: {e}", self.config.retry);
                    last_error = e.to_string();
                }
            }
        }
        Err(HoleError::Download {
            url: source.to_string(),
            attempts: self.config.retry,
            message: last_error,
        })
    }

    /// Fetches every item into `out_dir`; returns once all workers are done.
    pub fn run(&self, sources: &[String], out_dir: &Path) -> HoleResult<DownloadReport> {
        std::fs::create_dir_all(out_dir)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| HoleError::config_error(format!("download pool: {e}")))?;
        let log = FailureLog::new(&self.config.failure_log);
        let succeeded = AtomicUsize::new(0);

        info!(
            "Downloading {} items with {} workers",
            sources.len(),
            self.config.workers
        );
        pool.install(|| {
            sources.par_iter().for_each(|source| {
                match self.fetch_with_retry(source, out_dir) {
                    Ok(path) => {
                        succeeded.fetch_add(1, Ordering::Relaxed);
                        debug!("[OK] {source} -> {}", path.display());
                    }
                    Err(e) => {
                        warn!("[FAIL] {e}");
                        if let Err(log_err) = log.append(source) {
                            warn!("Could not record failure in {}: {log_err}", log.path().display());
                        }
                    }
                }
            })
        });

        let succeeded = succeeded.into_inner();
        let report = DownloadReport {
            total: sources.len(),
            succeeded,
            failed: sources.len() - succeeded,
        };
        info!("{report} (see {})", log.path().display());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fails each source a fixed number of times before succeeding.
    struct FlakyFetcher {
        failures: HashMap<String, usize>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl FlakyFetcher {
        fn new(failures: &[(&str, usize)]) -> Self {
            Self {
                failures: failures.iter().map(|(s, n)| (s.to_string(), *n)).collect(),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn calls(&self, source: &str) -> usize {
            self.calls.lock().unwrap().get(source).copied().unwrap_or(0)
        }
    }

    impl Fetcher for FlakyFetcher {
        fn fetch(&self, source: &str, out_dir: &Path) -> HoleResult<PathBuf> {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(source.to_string()).or_default();
            *n += 1;
            if *n <= self.failures.get(source).copied().unwrap_or(0) {
                return Err(HoleError::invalid_input("transient"));
            }
            Ok(out_dir.join(source))
        }
    }

    fn config(dir: &Path, workers: usize, retry: usize) -> DownloadConfig {
        DownloadConfig {
            workers,
            retry,
            failure_log: dir.join("failed.txt"),
        }
    }

    #[test]
    fn test_retry_then_failure_log() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let fetcher = FlakyFetcher::new(&[("a", 0), ("b", 2), ("c", 5)]);
        let downloader = Downloader::new(fetcher, config(dir.path(), 4, 3))?;
        let sources: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let report = downloader.run(&sources, &dir.path().join("out"))?;
        assert_eq!(
            report,
            DownloadReport {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
        assert_eq!(downloader.fetcher.calls("b"), 3);
        assert_eq!(downloader.fetcher.calls("c"), 3);

        let failed = std::fs::read_to_string(dir.path().join("failed.txt"))?;
        assert_eq!(failed, "c\n");
        Ok(())
    }

    #[test]
    fn test_failure_log_appends_across_runs() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let downloader = Downloader::new(
            FlakyFetcher::new(&[("x", 9), ("y", 9)]),
            config(dir.path(), 2, 1),
        )?;
        downloader.run(&["x".to_string()], dir.path())?;
        downloader.run(&["y".to_string()], dir.path())?;
        let failed = std::fs::read_to_string(dir.path().join("failed.txt"))?;
        assert_eq!(failed, "x\ny\n");
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = std::env::temp_dir();
        assert!(Downloader::new(LocalFetcher, config(&dir, 0, 3)).is_err());
        assert!(Downloader::new(LocalFetcher, config(&dir, 4, 0)).is_err());
    }

    #[test]
    fn test_local_fetcher_copies_file() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("sheet.png");
        std::fs::write(&src, b"png")?;
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out)?;
        let path = LocalFetcher.fetch(&src.to_string_lossy(), &out)?;
        assert_eq!(path, out.join("sheet.png"));
        assert_eq!(std::fs::read(path)?, b"png");
        Ok(())
    }

    #[test]
    fn test_local_fetcher_leaves_file_in_place() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("sheet.png");
        std::fs::write(&src, b"png")?;
        let path = LocalFetcher.fetch(&src.to_string_lossy(), dir.path())?;
        assert_eq!(path, src);
        assert_eq!(std::fs::read(&src)?, b"png");
        Ok(())
    }

    #[test]
    fn test_target_path_requires_file_name() {
        assert!(target_path("s3://bucket/", Path::new("/tmp")).is_err());
        assert_eq!(
            target_path("s3://bucket/a/b.png", Path::new("/tmp")).ok(),
            Some(PathBuf::from("/tmp/b.png"))
        );
    }
}
