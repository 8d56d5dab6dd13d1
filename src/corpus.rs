// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Corpus driver: one output table per annotated video.
//!
//! Iterates the annotation store in stored order, opens each video under the
//! configured directory, runs the record pipeline, and persists its output as
//! `<video stem>.csv` in the output directory. An unopenable video is
//! reported and skipped; the batch continues. A mid-video failure abandons
//! that video's table (the partial file is removed) and propagates.

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::annotations::AnnotationStore;
use crate::detector::PoseDetector;
use crate::error::{ExtractError, Result};
use crate::labeling::{DEFAULT_POSITIVE_EVENT, FrameLabeler};
use crate::pipeline::RecordStream;
use crate::source::FrameSource;
use crate::table::TableWriter;
use crate::{error, verbose};

/// Configuration for a corpus extraction run.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    /// Path to the temporal annotation file.
    pub annotations: PathBuf,
    /// Directory containing the input videos, keyed by annotation video_id.
    pub video_dir: PathBuf,
    /// Directory for the output tables; created if missing.
    pub output_dir: PathBuf,
    /// Event label that triggers interval-based labeling.
    pub positive_event: String,
}

impl CorpusConfig {
    /// Create a configuration with the default positive event.
    pub fn new(
        annotations: impl Into<PathBuf>,
        video_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            annotations: annotations.into(),
            video_dir: video_dir.into(),
            output_dir: output_dir.into(),
            positive_event: DEFAULT_POSITIVE_EVENT.to_string(),
        }
    }

    /// Override the positive-event name.
    #[must_use]
    pub fn with_positive_event(mut self, event: impl Into<String>) -> Self {
        self.positive_event = event.into();
        self
    }
}

/// Outcome counts for a corpus run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Videos fully processed into tables.
    pub processed: usize,
    /// Videos skipped because their source could not be opened.
    pub skipped: usize,
}

/// Run the extraction over every annotated video.
///
/// Annotation parsing errors abort the whole run - a corrupted annotation set
/// undermines every label decision. Per-video open failures are isolated:
/// the video is skipped with a diagnostic and the batch continues. Detector
/// failures mid-video remove the partial table and propagate; the caller
/// decides whether that is fatal.
///
/// # Errors
///
/// Returns [`ExtractError::AnnotationFormat`] for malformed annotations, IO
/// errors for the output directory, or any mid-video pipeline error.
pub fn run_corpus<D: PoseDetector>(config: &CorpusConfig, detector: &mut D) -> Result<RunSummary> {
    run_corpus_with(config, detector, |path| FrameSource::open(path))
}

/// Run the extraction with a custom frame-source opener.
///
/// Separates batch orchestration from video decoding: `open_source` is called
/// once per annotated video and may return any frame iterator, so the driver
/// can run against synthetic sources. [`run_corpus`] wires in
/// [`FrameSource::open`].
///
/// # Errors
///
/// Same contract as [`run_corpus`].
pub fn run_corpus_with<D, S, F>(
    config: &CorpusConfig,
    detector: &mut D,
    mut open_source: F,
) -> Result<RunSummary>
where
    D: PoseDetector,
    S: Iterator<Item = Result<DynamicImage>>,
    F: FnMut(&Path) -> Result<S>,
{
    let store = AnnotationStore::load(&config.annotations)?;
    let labeler = FrameLabeler::new(config.positive_event.clone());

    fs::create_dir_all(&config.output_dir)?;

    let mut summary = RunSummary::default();

    for (video_id, annotation) in store.iter() {
        let video_path = config.video_dir.join(video_id);
        let table_path = config.output_dir.join(table_name(video_id));

        verbose!("Processing {video_id} (event: {})", annotation.event);

        let source = match open_source(&video_path) {
            Ok(source) => source,
            Err(e @ ExtractError::SourceUnavailable(_)) => {
                error!("Skipping {video_id}: {e}");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        match write_table(source, detector, &labeler, annotation, &table_path) {
            Ok(frames) => {
                verbose!(
                    "Processed {video_id} -> {} ({frames} frames)",
                    table_path.display()
                );
                summary.processed += 1;
            }
            Err(e) => {
                // No partial table may survive as if it were complete.
                fs::remove_file(&table_path).ok();
                error!("Failed on {video_id}: {e}");
                return Err(e);
            }
        }
    }

    Ok(summary)
}

/// Stream one video's records into its table; returns the frame count.
fn write_table<D: PoseDetector>(
    frames: impl Iterator<Item = Result<DynamicImage>>,
    detector: &mut D,
    labeler: &FrameLabeler,
    annotation: &crate::annotations::VideoAnnotation,
    table_path: &Path,
) -> Result<u64> {
    let mut writer = TableWriter::create(table_path)?;
    let mut stream = RecordStream::new(frames, detector, labeler, annotation);

    for record in &mut stream {
        writer.write(&record?)?;
    }
    let frames = stream.frames_processed();
    writer.finish()?;
    Ok(frames)
}

/// Output table filename derived from the input video's base name.
fn table_name(video_id: &str) -> String {
    let stem = Path::new(video_id)
        .file_stem()
        .map_or_else(|| video_id.to_string(), |s| s.to_string_lossy().to_string());
    format!("{stem}.csv")
}
