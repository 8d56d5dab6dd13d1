// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for pose inference.
//!
//! Letterbox resizing to the model input size, normalization to [0, 1], and
//! conversion to an NCHW tensor, plus the inverse coordinate mapping used to
//! bring model-space keypoints back to original pixel space.

use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{ExtractError, Result};

/// Letterbox padding color (Ultralytics gray), normalized.
const LETTERBOX_NORM: f32 = 114.0 / 255.0;

/// Reciprocal of 255 for normalization.
const INV_255: f32 = 1.0 / 255.0;

/// Result of preprocessing an image, with the transform info needed to map
/// model-space coordinates back to the original image.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Preprocessed image tensor in NCHW format, normalized to [0, 1].
    pub tensor: Array4<f32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Compute letterbox geometry: resized dimensions, padding offsets, and the
/// scale factors for mapping coordinates back.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn letterbox_params(
    orig_width: u32,
    orig_height: u32,
    target_size: (usize, usize),
) -> (u32, u32, u32, u32, (f32, f32)) {
    let (target_h, target_w) = (target_size.0 as f32, target_size.1 as f32);
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    // Scale to fit within target while maintaining aspect ratio.
    let scale = (target_h / orig_h).min(target_w / orig_w);

    let new_w = ((orig_w * scale).round() as u32).max(1);
    let new_h = ((orig_h * scale).round() as u32).max(1);

    // Center alignment: split padding equally on both sides.
    let pad_left = (target_size.1 as u32).saturating_sub(new_w) / 2;
    let pad_top = (target_size.0 as u32).saturating_sub(new_h) / 2;

    let scale_x = new_w as f32 / orig_w;
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_left, pad_top, (scale_y, scale_x))
}

/// Letterbox an image to `target_size` (height, width) and build the model
/// input tensor.
///
/// # Errors
///
/// Returns [`ExtractError::ImageError`] if the resize backend rejects the
/// image buffers.
#[allow(clippy::cast_precision_loss)]
pub fn preprocess_image(
    image: &DynamicImage,
    target_size: (usize, usize),
) -> Result<PreprocessResult> {
    let (orig_w, orig_h) = image.dimensions();
    let (new_w, new_h, pad_left, pad_top, scale) = letterbox_params(orig_w, orig_h, target_size);

    let src_rgb = image.to_rgb8();
    let src_image = Image::from_vec_u8(orig_w, orig_h, src_rgb.into_raw(), PixelType::U8x3)
        .map_err(|e| ExtractError::ImageError(format!("Failed to create source image: {e}")))?;

    let mut dst_image = Image::new(new_w, new_h, PixelType::U8x3);
    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ExtractError::ImageError(format!("Failed to resize image: {e}")))?;

    let resized = dst_image.into_vec();

    let (target_h, target_w) = target_size;
    let mut tensor = Array4::<f32>::from_elem((1, 3, target_h, target_w), LETTERBOX_NORM);

    let (pad_left, pad_top) = (pad_left as usize, pad_top as usize);
    for y in 0..new_h as usize {
        for x in 0..new_w as usize {
            let offset = (y * new_w as usize + x) * 3;
            for c in 0..3 {
                tensor[[0, c, y + pad_top, x + pad_left]] =
                    f32::from(resized[offset + c]) * INV_255;
            }
        }
    }

    Ok(PreprocessResult {
        tensor,
        orig_shape: (orig_h, orig_w),
        scale,
        padding: (pad_top as f32, pad_left as f32),
    })
}

/// Map a model-space point back to original image space, clipped to bounds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn unscale_point(x: f32, y: f32, preprocess: &PreprocessResult) -> (f32, f32) {
    let (scale_y, scale_x) = preprocess.scale;
    let (pad_top, pad_left) = preprocess.padding;
    let (h, w) = (preprocess.orig_shape.0 as f32, preprocess.orig_shape.1 as f32);

    (
        ((x - pad_left) / scale_x).clamp(0.0, w),
        ((y - pad_top) / scale_y).clamp(0.0, h),
    )
}

/// Map model-space box coordinates back to original image space, clipped.
#[must_use]
pub fn unscale_box(coords: &[f32; 4], preprocess: &PreprocessResult) -> [f32; 4] {
    let (x1, y1) = unscale_point(coords[0], coords[1], preprocess);
    let (x2, y2) = unscale_point(coords[2], coords[3], preprocess);
    [x1, y1, x2, y2]
}
