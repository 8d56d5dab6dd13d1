// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Video frame sources.
//!
//! A [`FrameSource`] opens a video file and yields its frames sequentially in
//! decode order. Open failure is [`ExtractError::SourceUnavailable`] so the
//! corpus driver can skip the video and continue; the decoder is released when
//! the source is dropped, regardless of how iteration ended.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{ExtractError, Result};

#[cfg(feature = "video")]
use std::sync::Once;

#[cfg(feature = "video")]
static INIT: Once = Once::new();

/// Initialize `video-rs`/FFmpeg once. Safe to call multiple times.
#[cfg(feature = "video")]
fn init_video() {
    INIT.call_once(|| {
        if let Err(e) = video_rs::init() {
            eprintln!("Failed to initialize video-rs: {e}");
        }
    });
}

/// Sequential frame source over one video file.
///
/// Not restartable: re-running a pipeline requires a fresh source.
pub struct FrameSource {
    path: PathBuf,
    #[cfg(feature = "video")]
    decoder: video_rs::decode::Decoder,
    #[cfg(feature = "video")]
    finished: bool,
}

impl FrameSource {
    /// Open a video file for sequential decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::SourceUnavailable`] if the file cannot be
    /// opened or a decoder cannot be created for it.
    #[cfg(feature = "video")]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        init_video();

        let path = path.as_ref().to_path_buf();
        let decoder = video_rs::decode::Decoder::new(path.as_path()).map_err(|e| {
            ExtractError::SourceUnavailable(format!("{}: {e}", path.display()))
        })?;

        Ok(Self {
            path,
            decoder,
            finished: false,
        })
    }

    #[cfg(not(feature = "video"))]
    pub fn open<P: AsRef<Path>>(_path: P) -> Result<Self> {
        Err(ExtractError::FeatureNotEnabled(
            "Video decoding requires the 'video' feature".to_string(),
        ))
    }

    /// Path of the underlying video file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for FrameSource {
    type Item = Result<DynamicImage>;

    #[cfg(feature = "video")]
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.decoder.decode() {
            Ok((_ts, frame)) => Some(frame_to_image(&frame)),
            Err(_e) => {
                // video-rs surfaces end-of-stream as a decode error; treat any
                // decode error as exhaustion.
                self.finished = true;
                None
            }
        }
    }

    #[cfg(not(feature = "video"))]
    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

/// Convert a `video_rs` frame (HWC ndarray) to a `DynamicImage`.
#[cfg(feature = "video")]
fn frame_to_image(arr: &video_rs::Frame) -> Result<DynamicImage> {
    let shape = arr.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| ExtractError::ImageError("Frame height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| ExtractError::ImageError("Frame width exceeds u32::MAX".to_string()))?;

    let mut rgb_data = Vec::with_capacity(height as usize * width as usize * 3);
    for y in 0..height as usize {
        for x in 0..width as usize {
            rgb_data.push(arr[[y, x, 0]]);
            rgb_data.push(arr[[y, x, 1]]);
            rgb_data.push(arr[[y, x, 2]]);
        }
    }

    let img_buffer = image::RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        ExtractError::ImageError("Failed to create image from video frame".to_string())
    })?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "video")]
    #[test]
    fn test_open_missing_file_is_source_unavailable() {
        let result = FrameSource::open("definitely/not/here.mp4");
        assert!(matches!(
            result.unwrap_err(),
            ExtractError::SourceUnavailable(msg) if msg.contains("not/here.mp4")
        ));
    }
}
