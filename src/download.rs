// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Model downloading utilities.
//!
//! Fetches the default YOLO pose model from the Ultralytics GitHub releases
//! when it is not found locally, so a fresh checkout works without manual
//! model management.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ExtractError, Result};
use crate::info;

/// Default YOLO pose model name.
pub const DEFAULT_POSE_MODEL: &str = "yolo11n-pose.onnx";

/// URL for downloading the default YOLO pose model.
const DEFAULT_POSE_MODEL_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v8.3.0/yolo11n-pose.onnx";

/// Connection timeout in seconds.
const CONNECT_TIMEOUT: u64 = 30;

/// Read timeout in seconds.
const READ_TIMEOUT: u64 = 300;

/// Resolve a model path, downloading the default pose model if it is the one
/// requested and missing locally.
///
/// # Errors
///
/// Returns [`ExtractError::ModelLoadError`] if the model is missing and is
/// not the downloadable default, or if the download fails.
pub fn ensure_model(model: &str) -> Result<PathBuf> {
    let path = PathBuf::from(model);
    if path.exists() {
        return Ok(path);
    }

    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();

    if filename != DEFAULT_POSE_MODEL {
        return Err(ExtractError::ModelLoadError(format!(
            "Model file not found: {model}"
        )));
    }

    info!("Downloading {DEFAULT_POSE_MODEL} from {DEFAULT_POSE_MODEL_URL}...");
    download_file(DEFAULT_POSE_MODEL_URL, &path)?;
    info!("Saved model to '{}'", path.display());
    Ok(path)
}

/// Download a file from URL to the specified path.
///
/// Streams to a temporary file, then renames atomically so partial downloads
/// never masquerade as complete models.
fn download_file(url: &str, dest: &Path) -> Result<()> {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT)))
        .timeout_recv_body(Some(Duration::from_secs(READ_TIMEOUT)))
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let response = agent.get(url).call().map_err(|e| {
        ExtractError::ModelLoadError(format!("Failed to download {url}: {e}"))
    })?;

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let temp_path = dest.with_extension("part");
    let _ = fs::remove_file(&temp_path);

    let temp_file = File::create(&temp_path).map_err(|e| {
        ExtractError::ModelLoadError(format!(
            "Failed to create temp file {}: {e}",
            temp_path.display()
        ))
    })?;
    let mut writer = BufWriter::new(temp_file);

    let mut reader = response.into_body().into_reader();
    let mut buffer = [0u8; 65536];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            ExtractError::ModelLoadError(format!("Failed to read from network: {e}"))
        })?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read]).map_err(|e| {
            ExtractError::ModelLoadError(format!("Failed to write to temp file: {e}"))
        })?;
    }

    writer.flush().map_err(|e| {
        ExtractError::ModelLoadError(format!("Failed to flush temp file: {e}"))
    })?;
    drop(writer);

    fs::rename(&temp_path, dest).map_err(|e| {
        ExtractError::ModelLoadError(format!("Failed to finalize download: {e}"))
    })?;

    Ok(())
}
