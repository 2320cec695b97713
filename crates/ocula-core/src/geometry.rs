//! Iris diameter and monocular depth estimation.
//!
//! Human iris diameter is nearly constant across adults (about 11.8 mm), so
//! the apparent iris size in pixels doubles as a ruler: with a known focal
//! length it gives distance to the camera, and without one it still gives a
//! pixel-to-millimetre scale for the rest of the face.

use crate::landmarks::{EyeLandmarks, ImageSize, LandmarkPoint};
use crate::IRIS_DIAMETER_MM;

/// Euclidean distance between two pixel-space points.
pub fn pixel_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Distance in pixels between two normalized landmarks.
pub fn landmark_distance_px(a: LandmarkPoint, b: LandmarkPoint, size: ImageSize) -> f32 {
    pixel_distance(a.to_pixels(size), b.to_pixels(size))
}

/// Iris diameter in pixels: mean of the vertical (top–bottom) and horizontal
/// (left–right) extents.
pub fn iris_diameter_px(eye: &EyeLandmarks, size: ImageSize) -> f32 {
    let vertical = landmark_distance_px(eye.top, eye.bottom, size);
    let horizontal = landmark_distance_px(eye.left, eye.right, size);
    (vertical + horizontal) / 2.0
}

/// Pinhole-camera depth estimator for a known-size iris.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthEstimator {
    /// Focal length in pixels.
    pub focal_length_px: f32,
    /// Physical iris diameter assumed for the subject.
    pub iris_diameter_mm: f32,
}

impl DepthEstimator {
    pub fn new(focal_length_px: f32) -> Self {
        Self {
            focal_length_px,
            iris_diameter_mm: IRIS_DIAMETER_MM,
        }
    }

    /// Distance from the camera to the iris in millimetres.
    ///
    /// The off-axis offset of the iris from the image center lengthens the
    /// ray, so the focal length is replaced by `sqrt(f² + r²)` before applying
    /// similar triangles. Returns `f32::INFINITY` when the iris diameter is
    /// not positive (depth unknown).
    pub fn estimate_mm(&self, center: LandmarkPoint, iris_diameter_px: f32, size: ImageSize) -> f32 {
        if iris_diameter_px <= 0.0 || !iris_diameter_px.is_finite() {
            return f32::INFINITY;
        }
        let origin = (size.width as f32 / 2.0, size.height as f32 / 2.0);
        let off_axis = pixel_distance(origin, center.to_pixels(size));
        let ray = (self.focal_length_px * self.focal_length_px + off_axis * off_axis).sqrt();
        self.iris_diameter_mm * ray / iris_diameter_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> ImageSize {
        ImageSize::new(640, 480).unwrap()
    }

    /// An eye whose extreme points form an axis-aligned square of side `side_px`
    /// around `(cx, cy)` in pixel space.
    fn square_eye(cx: f32, cy: f32, side_px: f32, size: ImageSize) -> EyeLandmarks {
        let w = size.width as f32;
        let h = size.height as f32;
        let r = side_px / 2.0;
        EyeLandmarks {
            center: LandmarkPoint::new(cx / w, cy / h),
            top: LandmarkPoint::new(cx / w, (cy - r) / h),
            bottom: LandmarkPoint::new(cx / w, (cy + r) / h),
            left: LandmarkPoint::new((cx - r) / w, cy / h),
            right: LandmarkPoint::new((cx + r) / w, cy / h),
        }
    }

    #[test]
    fn test_pixel_distance_345() {
        assert!((pixel_distance((0.0, 0.0), (3.0, 4.0)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_square_iris_diameter_equals_side() {
        let eye = square_eye(320.0, 240.0, 24.0, size());
        assert!((iris_diameter_px(&eye, size()) - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_diameter_is_mean_of_axes() {
        let s = size();
        let mut eye = square_eye(320.0, 240.0, 20.0, s);
        // Stretch the vertical extent to 30 px; horizontal stays 20 px.
        eye.top = LandmarkPoint::new(320.0 / 640.0, 225.0 / 480.0);
        eye.bottom = LandmarkPoint::new(320.0 / 640.0, 255.0 / 480.0);
        assert!((iris_diameter_px(&eye, s) - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_depth_on_axis_is_similar_triangles() {
        let est = DepthEstimator::new(1000.0);
        let center = LandmarkPoint::new(0.5, 0.5);
        // 11.8 mm iris spanning 23.6 px at f = 1000 px → 500 mm.
        let depth = est.estimate_mm(center, 23.6, size());
        assert!((depth - 500.0).abs() < 1e-2, "depth = {depth}");
    }

    #[test]
    fn test_depth_off_axis_is_farther() {
        let est = DepthEstimator::new(1000.0);
        let on_axis = est.estimate_mm(LandmarkPoint::new(0.5, 0.5), 20.0, size());
        let off_axis = est.estimate_mm(LandmarkPoint::new(0.9, 0.1), 20.0, size());
        assert!(off_axis > on_axis);
    }

    #[test]
    fn test_depth_degenerate_iris_is_unknown() {
        let est = DepthEstimator::new(1000.0);
        let depth = est.estimate_mm(LandmarkPoint::new(0.5, 0.5), 0.0, size());
        assert!(depth.is_infinite());
    }
}
