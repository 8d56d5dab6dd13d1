// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint vector normalization.
//!
//! Raw detector output is reshaped into the fixed-width record schema: one
//! 34-value vector per person (17 `(x, y)` pairs in fixed joint order).
//! Coordinates are raw pixels, passed through with no unit conversion.

use ndarray::{ArrayD, Axis};

/// COCO pose keypoints per person.
pub const NUM_KEYPOINTS: usize = 17;

/// Flattened coordinate values per person (x and y for each keypoint).
pub const VECTOR_LEN: usize = 2 * NUM_KEYPOINTS;

/// Flattened, fixed-width keypoint coordinates for one person.
pub type KeypointVector = [f32; VECTOR_LEN];

/// Normalize raw per-person detections into fixed-width keypoint vectors.
///
/// One output vector per detected person, in detector order - the index
/// becomes the `person_id`. If no persons were detected, a single all-zero
/// placeholder vector is returned so a frame always produces output.
#[must_use]
pub fn normalize_detections(raw: &[ArrayD<f32>]) -> Vec<KeypointVector> {
    if raw.is_empty() {
        return vec![[0.0; VECTOR_LEN]];
    }
    raw.iter().map(flatten_person).collect()
}

/// Flatten one person's keypoint array into exactly [`VECTOR_LEN`] values.
///
/// Accepts `(K, 2)` data or the same wrapped in leading unit axes (some
/// detector backends emit `(1, K, 2)` per person); unit axes are squeezed
/// before flattening in row-major order, giving `x1, y1, x2, y2, ...`.
/// Fewer than 17 points are right-padded with zeros; more than
/// [`VECTOR_LEN`] values are truncated to the first 17 points.
fn flatten_person(person: &ArrayD<f32>) -> KeypointVector {
    let mut view = person.view();
    while view.ndim() > 2 && view.shape()[0] == 1 {
        view = view.index_axis_move(Axis(0), 0);
    }

    let mut coords = [0.0; VECTOR_LEN];
    for (slot, value) in coords.iter_mut().zip(view.iter()) {
        *slot = *value;
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn person(points: usize) -> ArrayD<f32> {
        // Keypoint k gets coordinates (k, 10k) so order is checkable.
        Array::from_shape_fn((points, 2), |(k, c)| {
            if c == 0 { k as f32 } else { 10.0 * k as f32 }
        })
        .into_dyn()
    }

    #[test]
    fn test_no_persons_yields_single_zero_vector() {
        let vectors = normalize_detections(&[]);
        assert_eq!(vectors.len(), 1);
        assert!(vectors[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_full_person_flattens_in_order() {
        let vectors = normalize_detections(&[person(17)]);
        assert_eq!(vectors.len(), 1);
        let v = vectors[0];
        assert_eq!(v[0], 0.0);
        assert_eq!(v[1], 0.0);
        assert_eq!(v[2], 1.0);
        assert_eq!(v[3], 10.0);
        assert_eq!(v[32], 16.0);
        assert_eq!(v[33], 160.0);
    }

    #[test]
    fn test_short_person_right_padded() {
        let vectors = normalize_detections(&[person(5)]);
        let v = vectors[0];
        assert_eq!(v[8], 4.0);
        assert_eq!(v[9], 40.0);
        assert!(v[10..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_oversized_person_truncated() {
        let vectors = normalize_detections(&[person(20)]);
        let v = vectors[0];
        assert_eq!(v.len(), VECTOR_LEN);
        assert_eq!(v[33], 160.0);
    }

    #[test]
    fn test_nested_wrapper_squeezed() {
        let nested = person(17).into_shape_with_order((1, 17, 2)).unwrap().into_dyn();
        let flat = normalize_detections(&[person(17)]);
        let unwrapped = normalize_detections(&[nested]);
        assert_eq!(flat, unwrapped);
    }

    #[test]
    fn test_person_order_preserved() {
        let a = person(17);
        let b = person(3);
        let vectors = normalize_detections(&[a, b]);
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0][33], 160.0);
        assert_eq!(vectors[1][4], 2.0);
        assert!(vectors[1][6..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_point_person() {
        let empty = Array::<f32, _>::zeros((0, 2)).into_dyn();
        let vectors = normalize_detections(&[empty]);
        assert_eq!(vectors.len(), 1);
        assert!(vectors[0].iter().all(|&v| v == 0.0));
    }
}
