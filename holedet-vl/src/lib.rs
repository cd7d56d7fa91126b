//! # holedet VL
//!
//! The vision-language model boundary of holedet.
//!
//! ## Module Structure
//!
//! - `prompt` - The detection instruction shared by training and inference
//! - `chat` - Chat-format training samples, JSON and JSONL files
//! - `output` - Fenced-JSON extraction and detection parsing
//! - `detector` - The [`HoleDetector`] handle and a response replayer
//!
//! ```
//! use holedet_vl::output::parse_detections;
//!
//! # fn main() -> Result<(), holedet_core::core::HoleError> {
//! let response = "```json\n[{\"category\": \"圆孔\", \"bbox_2d\": [1, 2, 3, 4], \"size\": \"18mm\"}]\n```";
//! let detections = parse_detections(response)?;
//! assert_eq!(detections[0].size, "18mm");
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod detector;
pub mod output;
pub mod prompt;

pub use chat::{ChatMessage, Role, TrainingSample};
pub use detector::{HoleDetector, ResponseArchive};
pub use output::{Detection, extract_json_block, group_by_category, parse_detections};
pub use prompt::DETECTION_PROMPT;
