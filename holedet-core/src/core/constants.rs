//! Constants used throughout the pipeline.

/// Side length of the normalized coordinate grid used as the label space.
pub const NORMALIZED_GRID: i32 = 1000;

/// Default size-quantization factor for the resize planner.
pub const DEFAULT_FACTOR: u32 = 32;

/// Default lower pixel budget for the resize planner.
pub const DEFAULT_MIN_PIXELS: u64 = 2 * 2 * 32 * 32;

/// Default upper pixel budget for the resize planner.
pub const DEFAULT_MAX_PIXELS: u64 = 32 * 32 * 4 * 2560;

/// Largest accepted ratio between the long and the short image side.
pub const MAX_ASPECT_RATIO: f64 = 200.0;

/// View tag that marks the expanded (unfolded) view of a part.
pub const EXPAND_VIEW_TAG: &str = "ExpandView";

/// Default number of concurrent download workers.
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 16;

/// Default number of attempts per download.
pub const DEFAULT_DOWNLOAD_RETRY: usize = 3;

/// Upper limit on download workers.
pub const MAX_DOWNLOAD_WORKERS: usize = 256;
