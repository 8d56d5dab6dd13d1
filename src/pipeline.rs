// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-video record pipeline.
//!
//! [`RecordStream`] turns a sequential frame source into the ordered sequence
//! of output records for one video: count the frame, detect persons, normalize
//! their keypoints, decide the frame's label, and emit one record per person.
//! Processing always runs through the entire video; interval boundaries never
//! terminate the stream.

use std::collections::VecDeque;

use image::DynamicImage;

use crate::annotations::VideoAnnotation;
use crate::detector::PoseDetector;
use crate::error::Result;
use crate::keypoints::{KeypointVector, normalize_detections};
use crate::labeling::FrameLabeler;

/// One output row: a person detected (or the zero-person placeholder) on one
/// frame, with its flattened keypoint coordinates and binary label.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    /// 1-based frame index within the video.
    pub frame: u64,
    /// 0-based position of the person in the frame's detection list. Not an
    /// identity tracked across frames.
    pub person_id: usize,
    /// Flattened keypoint coordinates `x1, y1, ..., x17, y17`.
    pub coords: KeypointVector,
    /// Binary event label for the frame.
    pub label: u8,
}

/// Lazy, finite stream of [`OutputRecord`]s for one video.
///
/// Not restartable - a fresh frame source is required to re-run. The frame
/// counter starts at 0 and increments once per decoded frame, so frames are
/// 1-based with no gaps. A frame or detector error is yielded once, after
/// which the stream is exhausted; silently skipping frames would corrupt
/// frame-index contiguity.
pub struct RecordStream<'a, D, I> {
    frames: I,
    detector: &'a mut D,
    labeler: &'a FrameLabeler,
    annotation: &'a VideoAnnotation,
    frame_count: u64,
    pending: VecDeque<OutputRecord>,
    done: bool,
}

impl<'a, D, I> RecordStream<'a, D, I>
where
    D: PoseDetector,
    I: Iterator<Item = Result<DynamicImage>>,
{
    /// Create a record stream over `frames` for a video with the given
    /// annotation.
    pub fn new(
        frames: I,
        detector: &'a mut D,
        labeler: &'a FrameLabeler,
        annotation: &'a VideoAnnotation,
    ) -> Self {
        Self {
            frames,
            detector,
            labeler,
            annotation,
            frame_count: 0,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Number of frames consumed so far.
    #[must_use]
    pub const fn frames_processed(&self) -> u64 {
        self.frame_count
    }

    /// Process the next frame into pending records.
    fn advance(&mut self) -> Option<Result<()>> {
        let frame = match self.frames.next()? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        self.frame_count += 1;

        let detections = match self.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => return Some(Err(e)),
        };

        let vectors = normalize_detections(&detections);
        let label = self.labeler.label(
            self.frame_count,
            &self.annotation.event,
            &self.annotation.intervals,
        );

        for (person_id, coords) in vectors.into_iter().enumerate() {
            self.pending.push_back(OutputRecord {
                frame: self.frame_count,
                person_id,
                coords,
                label,
            });
        }

        Some(Ok(()))
    }
}

impl<D, I> Iterator for RecordStream<'_, D, I>
where
    D: PoseDetector,
    I: Iterator<Item = Result<DynamicImage>>,
{
    type Item = Result<OutputRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            match self.advance() {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
