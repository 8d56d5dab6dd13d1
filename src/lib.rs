// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Pose Extraction Library
//!
//! Converts a temporally annotated video corpus into per-frame, per-person
//! pose keypoint tables (CSV) for downstream action/event classification,
//! such as fight detection.
//!
//! For every video named in the annotation file, a YOLO pose model is run
//! over every frame and one row is written per detected person:
//! `frame, person_id, x1, y1, ..., x17, y17, label`. The binary label is 1
//! when the video's event matches the configured positive event and the
//! frame lies inside an annotated interval (boundaries inclusive).
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use pose_extract::{CorpusConfig, YoloPose, run_corpus};
//!
//! fn main() -> Result<(), pose_extract::ExtractError> {
//!     let mut detector = YoloPose::load("yolo11n-pose.onnx")?;
//!     let config = CorpusConfig::new("annotations/temporal_annotation.txt", "dataset", "csv");
//!     let summary = run_corpus(&config, &mut detector)?;
//!     println!("Processed {} videos", summary.processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Quick Start (CLI)
//!
//! ```bash
//! pose-extract extract --annotations annotations/temporal_annotation.txt \
//!     --videos dataset --output csv
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`annotations`] | Temporal annotation parsing ([`AnnotationStore`]) |
//! | [`labeling`] | Binary frame labeling ([`FrameLabeler`]) |
//! | [`keypoints`] | Fixed-width keypoint vector normalization |
//! | [`detector`] | [`PoseDetector`] capability and the [`YoloPose`] ONNX implementation |
//! | [`source`] | Sequential video frame source ([`FrameSource`]) |
//! | [`pipeline`] | Per-video record stream ([`RecordStream`], [`OutputRecord`]) |
//! | [`table`] | CSV output tables ([`TableWriter`]) |
//! | [`corpus`] | Batch driver over all annotated videos ([`run_corpus`]) |
//! | [`download`] | Default model fetching |
//! | [`error`] | Error types ([`ExtractError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `video` | Video decoding via FFmpeg (default) |

// Modules
pub mod annotations;
pub mod cli;
pub mod corpus;
pub mod detector;
pub mod download;
pub mod error;
pub mod keypoints;
pub mod labeling;
pub mod pipeline;
pub mod preprocessing;
pub mod source;
pub mod table;
pub mod utils;

// Re-export main types for convenience
pub use annotations::{AnnotationStore, Interval, VideoAnnotation};
pub use corpus::{CorpusConfig, RunSummary, run_corpus, run_corpus_with};
pub use detector::{DetectorConfig, PoseDetector, YoloPose};
pub use error::{ExtractError, Result};
pub use keypoints::{KeypointVector, NUM_KEYPOINTS, VECTOR_LEN, normalize_detections};
pub use labeling::{DEFAULT_POSITIVE_EVENT, FrameLabeler};
pub use pipeline::{OutputRecord, RecordStream};
pub use source::FrameSource;
pub use table::{TableWriter, table_header};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pose-extract");
    }
}
