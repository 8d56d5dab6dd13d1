// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Binary frame labeling from event labels and annotated intervals.

use crate::annotations::Interval;

/// Event label that triggers interval-based labeling. All other events force
/// label 0 regardless of intervals.
pub const DEFAULT_POSITIVE_EVENT: &str = "Fighting";

/// Decides the binary label of a frame from a video's resolved annotation.
#[derive(Debug, Clone)]
pub struct FrameLabeler {
    positive_event: String,
}

impl Default for FrameLabeler {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE_EVENT)
    }
}

impl FrameLabeler {
    /// Create a labeler with the given positive-event name.
    pub fn new(positive_event: impl Into<String>) -> Self {
        Self {
            positive_event: positive_event.into(),
        }
    }

    /// The configured positive-event name.
    #[must_use]
    pub fn positive_event(&self) -> &str {
        &self.positive_event
    }

    /// Label a frame: 1 iff `event` is the positive event and `frame` lies
    /// within some closed interval (boundaries included), else 0.
    ///
    /// Intervals are scanned linearly; the corpus format carries at most two
    /// per video, but any count works. Overlapping or unordered intervals are
    /// harmless (union semantics).
    #[must_use]
    pub fn label(&self, frame: u64, event: &str, intervals: &[Interval]) -> u8 {
        if event != self.positive_event {
            return 0;
        }
        u8::from(intervals.iter().any(|i| i.contains(frame)))
    }
}
