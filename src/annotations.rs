// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Temporal annotation parsing.
//!
//! The annotation file is plain text, one record per line, with exactly six
//! whitespace-separated tokens:
//!
//! ```text
//! video_id event start1 end1 start2 end2
//! ```
//!
//! `-1` in a start/end slot means "no interval". Blank lines are skipped.
//! Malformed lines abort parsing with [`ExtractError::AnnotationFormat`];
//! a corrupted annotation set would undermine every label decision, so no
//! partial store is ever returned.

use std::fs;
use std::path::Path;

use crate::error::{ExtractError, Result};

/// Number of whitespace-separated tokens on a valid annotation line.
const TOKENS_PER_LINE: usize = 6;

/// Sentinel marking an absent interval bound.
const NO_INTERVAL: i64 = -1;

/// Closed frame-index interval, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// First frame of the interval.
    pub start: u64,
    /// Last frame of the interval (inclusive).
    pub end: u64,
}

impl Interval {
    /// Check whether `frame` lies within this interval (boundaries included).
    #[must_use]
    pub const fn contains(&self, frame: u64) -> bool {
        self.start <= frame && frame <= self.end
    }
}

/// Resolved annotation for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAnnotation {
    /// Event label, e.g. "Fighting" or "Normal".
    pub event: String,
    /// Zero to two frame intervals during which the event occurs.
    pub intervals: Vec<Interval>,
}

/// Ordered mapping from video identifier to its [`VideoAnnotation`].
///
/// Entries preserve first-insertion order. A repeated `video_id` overwrites
/// the existing entry in place (last write wins) - an explicit policy, since
/// the corpus format does not guarantee unique keys.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    entries: Vec<(String, VideoAnnotation)>,
}

impl AnnotationStore {
    /// Parse an annotation file's contents.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::AnnotationFormat`] naming the offending line
    /// if any non-blank line has the wrong token count, a non-integer
    /// interval bound, or a negative bound other than the `-1` sentinel.
    pub fn parse(text: &str) -> Result<Self> {
        let mut store = Self::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != TOKENS_PER_LINE {
                return Err(ExtractError::AnnotationFormat(format!(
                    "line {}: expected {} fields, found {}: '{}'",
                    idx + 1,
                    TOKENS_PER_LINE,
                    tokens.len(),
                    line
                )));
            }

            let video_id = tokens[0].to_string();
            let event = tokens[1].to_string();

            let mut intervals = Vec::new();
            for pair in tokens[2..].chunks(2) {
                let start = parse_bound(pair[0], idx, line)?;
                let end = parse_bound(pair[1], idx, line)?;
                if let Some(interval) = build_interval(start, end, idx, line)? {
                    intervals.push(interval);
                }
            }

            store.insert(video_id, VideoAnnotation { event, intervals });
        }

        Ok(store)
    }

    /// Read and parse an annotation file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or an
    /// [`ExtractError::AnnotationFormat`] for malformed content.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Insert an annotation, overwriting any existing entry for the same
    /// video in place so the original insertion position is kept.
    fn insert(&mut self, video_id: String, annotation: VideoAnnotation) {
        if let Some(slot) = self.entries.iter_mut().find(|(id, _)| *id == video_id) {
            slot.1 = annotation;
        } else {
            self.entries.push((video_id, annotation));
        }
    }

    /// Look up a video's annotation by identifier.
    #[must_use]
    pub fn get(&self, video_id: &str) -> Option<&VideoAnnotation> {
        self.entries
            .iter()
            .find(|(id, _)| id == video_id)
            .map(|(_, ann)| ann)
    }

    /// Iterate entries in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VideoAnnotation)> {
        self.entries.iter().map(|(id, ann)| (id.as_str(), ann))
    }

    /// Number of distinct videos in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a single interval bound token.
fn parse_bound(token: &str, idx: usize, line: &str) -> Result<i64> {
    token.parse::<i64>().map_err(|_| {
        ExtractError::AnnotationFormat(format!(
            "line {}: non-integer interval bound '{}': '{}'",
            idx + 1,
            token,
            line
        ))
    })
}

/// Build an interval from a bound pair, or `None` if either bound is the
/// `-1` sentinel.
fn build_interval(start: i64, end: i64, idx: usize, line: &str) -> Result<Option<Interval>> {
    if start == NO_INTERVAL || end == NO_INTERVAL {
        return Ok(None);
    }
    if start < 0 || end < 0 {
        return Err(ExtractError::AnnotationFormat(format!(
            "line {}: negative interval bound ({start}, {end}): '{}'",
            idx + 1,
            line
        )));
    }
    #[allow(clippy::cast_sign_loss)]
    Ok(Some(Interval {
        start: start as u64,
        end: end as u64,
    }))
}
