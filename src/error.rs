// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the extraction library.

use std::fmt;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Main error type for the extraction library.
#[derive(Debug)]
pub enum ExtractError {
    /// Malformed temporal annotation line. Fatal to the whole run.
    AnnotationFormat(String),
    /// A video resource could not be opened. Recovered per video by the corpus driver.
    SourceUnavailable(String),
    /// The pose detector failed on a frame. Propagates; skipping frames would
    /// corrupt frame-index contiguity.
    DetectorFailure(String),
    /// Error loading the ONNX model.
    ModelLoadError(String),
    /// Error processing images.
    ImageError(String),
    /// Video/stream processing error.
    VideoError(String),
    /// Error writing an output table.
    TableError(String),
    /// Invalid configuration provided.
    ConfigError(String),
    /// Wrapped `std::io::Error`.
    Io(std::io::Error),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnnotationFormat(msg) => write!(f, "Annotation format error: {msg}"),
            Self::SourceUnavailable(msg) => write!(f, "Source unavailable: {msg}"),
            Self::DetectorFailure(msg) => write!(f, "Detector failure: {msg}"),
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::TableError(msg) => write!(f, "Table error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for ExtractError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

impl From<csv::Error> for ExtractError {
    fn from(err: csv::Error) -> Self {
        Self::TableError(err.to_string())
    }
}
