// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose keypoint detection.
//!
//! The pipeline depends only on the [`PoseDetector`] capability: one frame in,
//! an ordered list of per-person keypoint arrays out. The detector is an
//! expensive shared resource - construct it once and inject it, rather than
//! relying on process-wide state.
//!
//! [`YoloPose`] is the shipped implementation, wrapping an ONNX Runtime
//! session over an Ultralytics YOLO pose model.

use std::path::Path;

use image::DynamicImage;
use ndarray::{Array2, Array4, ArrayD, s};
use ort::session::Session;
use ort::value::TensorRef;

use crate::error::{ExtractError, Result};
use crate::keypoints::NUM_KEYPOINTS;
use crate::preprocessing::{PreprocessResult, preprocess_image, unscale_box, unscale_point};
use crate::utils::nms;

/// Default model input size when the ONNX metadata does not carry one.
const DEFAULT_IMGSZ: (usize, usize) = (640, 640);

/// Values per keypoint in pose model output (x, y, visibility).
const KPT_DIM: usize = 3;

/// Capability interface for pose keypoint detection.
///
/// `detect` returns zero or more persons for the frame, each an ordered
/// keypoint coordinate array of up to 17 `(x, y)` pairs in raw pixel space.
/// Detector order is significant: the position becomes the `person_id`.
pub trait PoseDetector {
    /// Detect pose keypoints for every person in the frame.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::DetectorFailure`] if inference fails.
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<ArrayD<f32>>>;
}

/// Configuration for YOLO pose detection.
///
/// Builder pattern for convenient construction:
///
/// ```rust
/// use pose_extract::DetectorConfig;
///
/// let config = DetectorConfig::new()
///     .with_confidence(0.5)
///     .with_iou(0.45)
///     .with_threads(4);
/// ```
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Confidence threshold for detections (0.0 to 1.0).
    pub confidence_threshold: f32,
    /// `IoU` threshold for Non-Maximum Suppression (0.0 to 1.0).
    pub iou_threshold: f32,
    /// Explicit input image size (height, width). If `None`, the model's
    /// metadata is used, falling back to 640x640.
    pub imgsz: Option<(usize, usize)>,
    /// Number of intra-op threads for ONNX Runtime; 0 lets the runtime choose.
    pub num_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            imgsz: None,
            num_threads: 0,
        }
    }
}

impl DetectorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold.
    #[must_use]
    pub const fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the `IoU` threshold for NMS.
    #[must_use]
    pub const fn with_iou(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the input image size.
    #[must_use]
    pub const fn with_imgsz(mut self, height: usize, width: usize) -> Self {
        self.imgsz = Some((height, width));
        self
    }

    /// Set the number of intra-op threads; 0 for auto-configuration.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }
}

/// YOLO pose model backed by ONNX Runtime.
pub struct YoloPose {
    session: Session,
    input_name: String,
    output_name: String,
    imgsz: (usize, usize),
    config: DetectorConfig,
}

impl YoloPose {
    /// Load a YOLO pose model from an ONNX file with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, DetectorConfig::default())
    }

    /// Load a YOLO pose model with custom configuration.
    ///
    /// The input size is taken from the config if set, otherwise from the
    /// model's ONNX custom metadata (`imgsz` key).
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: DetectorConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExtractError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| {
                ExtractError::ModelLoadError(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| {
                ExtractError::ModelLoadError(format!("Failed to set optimization level: {e}"))
            })?
            .with_intra_threads(config.num_threads)
            .map_err(|e| {
                ExtractError::ModelLoadError(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(path)
            .map_err(|e| ExtractError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let imgsz = config
            .imgsz
            .or_else(|| Self::metadata_imgsz(&session))
            .unwrap_or(DEFAULT_IMGSZ);

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output0".to_string());

        Ok(Self {
            session,
            input_name,
            output_name,
            imgsz,
            config,
        })
    }

    /// The model input size (height, width) in effect.
    #[must_use]
    pub const fn imgsz(&self) -> (usize, usize) {
        self.imgsz
    }

    /// Read the input size from the model's ONNX custom metadata, if present.
    /// Ultralytics exports store it as e.g. `[640, 640]`.
    fn metadata_imgsz(session: &Session) -> Option<(usize, usize)> {
        let metadata = session.metadata().ok()?;
        let raw = metadata.custom("imgsz").ok()??;
        parse_imgsz(&raw)
    }

    /// Run the ONNX session on a preprocessed input tensor.
    fn run_inference(&mut self, input: &Array4<f32>) -> Result<(Vec<f32>, Vec<usize>)> {
        let input_contiguous = input.as_standard_layout();

        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            ExtractError::DetectorFailure(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![&self.input_name => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| ExtractError::DetectorFailure(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ExtractError::DetectorFailure(format!("Output '{}' not found", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ExtractError::DetectorFailure(format!("Failed to extract output: {e}")))?;

        #[allow(clippy::cast_sign_loss)]
        let shape_vec: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        Ok((data.to_vec(), shape_vec))
    }
}

impl PoseDetector for YoloPose {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Vec<ArrayD<f32>>> {
        let preprocess = preprocess_image(frame, self.imgsz)?;
        let (output, shape) = self.run_inference(&preprocess.tensor)?;
        Ok(decode_pose(
            &output,
            &shape,
            &preprocess,
            self.config.confidence_threshold,
            self.config.iou_threshold,
        ))
    }
}

impl std::fmt::Debug for YoloPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloPose")
            .field("imgsz", &self.imgsz)
            .field("config", &self.config)
            .finish()
    }
}

/// Parse an Ultralytics `imgsz` metadata value like `[640, 640]`.
fn parse_imgsz(raw: &str) -> Option<(usize, usize)> {
    let mut dims = raw
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter_map(|t| t.trim().parse::<usize>().ok());
    let h = dims.next()?;
    let w = dims.next().unwrap_or(h);
    Some((h, w))
}

/// Decode raw pose model output into per-person keypoint arrays.
///
/// YOLO pose models output shape [1, 56, N] (or transposed), where
/// 56 = 4 (bbox) + 1 (person class) + 51 (17 keypoints x 3). Candidates below
/// the confidence threshold are discarded, NMS removes duplicate boxes, and
/// surviving keypoints are mapped back to original pixel space. Each person
/// comes out as a `(17, 2)` array; the visibility channel is dropped.
#[allow(clippy::cast_precision_loss)]
fn decode_pose(
    output: &[f32],
    output_shape: &[usize],
    preprocess: &PreprocessResult,
    confidence_threshold: f32,
    iou_threshold: f32,
) -> Vec<ArrayD<f32>> {
    let kpt_features = NUM_KEYPOINTS * KPT_DIM;
    let expected_features = 4 + 1 + kpt_features;

    let (num_preds, is_transposed) = match output_shape {
        [_, a, b] => {
            if *a == expected_features || (a < b && *a >= 4 + kpt_features) {
                (*b, false) // [1, features, preds]
            } else {
                (*a, true) // [1, preds, features]
            }
        }
        [a, b] => {
            if a < b {
                (*b, false)
            } else {
                (*a, true)
            }
        }
        _ => (0, false),
    };

    if output.is_empty() || num_preds == 0 {
        return vec![];
    }

    let actual_features = output.len() / num_preds;
    if actual_features < 4 + kpt_features {
        return vec![];
    }
    let num_classes = (actual_features - 4 - kpt_features).max(1);

    // Convert to 2D [preds, features].
    let output_2d = if is_transposed {
        Array2::from_shape_vec((num_preds, actual_features), output.to_vec())
            .unwrap_or_else(|_| Array2::zeros((0, 0)))
    } else {
        let arr = Array2::from_shape_vec((actual_features, num_preds), output.to_vec())
            .unwrap_or_else(|_| Array2::zeros((0, 0)));
        arr.t().to_owned()
    };

    if output_2d.is_empty() {
        return vec![];
    }

    let mut boxes: Vec<([f32; 4], f32)> = Vec::new();
    let mut keypoints: Vec<Array2<f32>> = Vec::new();

    for i in 0..num_preds {
        let class_scores = output_2d.slice(s![i, 4..4 + num_classes]);
        let score = class_scores
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(0.0f32, f32::max);

        if score < confidence_threshold {
            continue;
        }

        // Box in xywh, converted to xyxy for NMS.
        let cx = output_2d[[i, 0]];
        let cy = output_2d[[i, 1]];
        let w = output_2d[[i, 2]];
        let h = output_2d[[i, 3]];
        let bbox = unscale_box(
            &[cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            preprocess,
        );

        let kpt_start = 4 + num_classes;
        let mut person = Array2::<f32>::zeros((NUM_KEYPOINTS, 2));
        for k in 0..NUM_KEYPOINTS {
            let offset = kpt_start + k * KPT_DIM;
            let (x, y) = unscale_point(output_2d[[i, offset]], output_2d[[i, offset + 1]], preprocess);
            person[[k, 0]] = x;
            person[[k, 1]] = y;
        }

        boxes.push((bbox, score));
        keypoints.push(person);
    }

    nms(&boxes, iou_threshold)
        .into_iter()
        .map(|idx| keypoints[idx].clone().into_dyn())
        .collect()
}
