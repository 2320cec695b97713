//! Landmark types and the fixed index layout of the iris and face models.
//!
//! The iris model emits 10 normalized points, five per eye. Within each eye
//! the raw order is center, right, top, left, bottom; splitting re-orders
//! them into [`EyeLandmarks`] so downstream code can address points by name.
//!
//! The face model emits a dense mesh. Only the four eye corners (canthi) are
//! read from it.

use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

/// Number of points in an iris landmark list (5 per eye).
pub const IRIS_LANDMARK_COUNT: usize = 10;

/// Raw indices of the left eye in split order: center, top, bottom, left, right.
pub const LEFT_EYE_INDICES: [usize; 5] = [0, 2, 4, 3, 1];
/// Raw indices of the right eye in split order: center, top, bottom, left, right.
pub const RIGHT_EYE_INDICES: [usize; 5] = [5, 7, 9, 6, 8];

/// Face mesh index of the left eye's outer (temporal) corner.
pub const LEFT_OUTER_CANTHUS: usize = 33;
/// Face mesh index of the left eye's inner (nasal) corner.
pub const LEFT_INNER_CANTHUS: usize = 133;
/// Face mesh index of the right eye's inner (nasal) corner.
pub const RIGHT_INNER_CANTHUS: usize = 362;
/// Face mesh index of the right eye's outer (temporal) corner.
pub const RIGHT_OUTER_CANTHUS: usize = 263;

/// Minimum face landmark count needed to read all four canthi.
pub const MIN_FACE_LANDMARKS: usize = RIGHT_INNER_CANTHUS + 1;

/// A landmark in normalized image coordinates (`[0, 1]` relative to width/height).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Denormalize into pixel coordinates.
    pub fn to_pixels(self, size: ImageSize) -> (f32, f32) {
        (self.x * size.width as f32, self.y * size.height as f32)
    }
}

/// Image dimensions in pixels. Both dimensions are non-zero once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Result<Self, ProcessError> {
        Self { width, height }.validated()
    }

    /// Reject zero-sized images (deserialization bypasses [`ImageSize::new`]).
    pub fn validated(self) -> Result<Self, ProcessError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProcessError::InvalidImageSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// One eye's five iris landmarks, addressed by role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarks {
    pub center: LandmarkPoint,
    pub top: LandmarkPoint,
    pub bottom: LandmarkPoint,
    pub left: LandmarkPoint,
    pub right: LandmarkPoint,
}

impl EyeLandmarks {
    fn from_indices(points: &[LandmarkPoint; IRIS_LANDMARK_COUNT], idx: [usize; 5]) -> Self {
        Self {
            center: points[idx[0]],
            top: points[idx[1]],
            bottom: points[idx[2]],
            left: points[idx[3]],
            right: points[idx[4]],
        }
    }

    /// The five points in split order: center, top, bottom, left, right.
    pub fn points(&self) -> [LandmarkPoint; 5] {
        [self.center, self.top, self.bottom, self.left, self.right]
    }
}

/// A validated 10-point iris landmark list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrisLandmarks([LandmarkPoint; IRIS_LANDMARK_COUNT]);

impl IrisLandmarks {
    /// Validate the length of a raw landmark list.
    pub fn from_slice(points: &[LandmarkPoint]) -> Result<Self, ProcessError> {
        let points: [LandmarkPoint; IRIS_LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| ProcessError::IrisLandmarkCount(points.len()))?;
        Ok(Self(points))
    }

    pub fn left_eye(&self) -> EyeLandmarks {
        EyeLandmarks::from_indices(&self.0, LEFT_EYE_INDICES)
    }

    pub fn right_eye(&self) -> EyeLandmarks {
        EyeLandmarks::from_indices(&self.0, RIGHT_EYE_INDICES)
    }

    /// Split into `(left, right)` eye subsets.
    pub fn split(&self) -> (EyeLandmarks, EyeLandmarks) {
        (self.left_eye(), self.right_eye())
    }
}

/// Outer (temporal) and inner (nasal) corner of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeCorners {
    pub outer: LandmarkPoint,
    pub inner: LandmarkPoint,
}

/// The four canthus landmarks read from a face mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canthi {
    pub left: EyeCorners,
    pub right: EyeCorners,
}

impl Canthi {
    pub fn from_face(face: &[LandmarkPoint]) -> Result<Self, ProcessError> {
        if face.len() < MIN_FACE_LANDMARKS {
            return Err(ProcessError::FaceLandmarkCount {
                len: face.len(),
                required: MIN_FACE_LANDMARKS,
            });
        }
        Ok(Self {
            left: EyeCorners {
                outer: face[LEFT_OUTER_CANTHUS],
                inner: face[LEFT_INNER_CANTHUS],
            },
            right: EyeCorners {
                outer: face[RIGHT_OUTER_CANTHUS],
                inner: face[RIGHT_INNER_CANTHUS],
            },
        })
    }

    /// Corner points in overlay order: right outer, right inner, left inner, left outer.
    pub fn overlay_points(&self) -> [LandmarkPoint; 4] {
        [
            self.right.outer,
            self.right.inner,
            self.left.inner,
            self.left.outer,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Landmarks whose x encodes the raw index, so splits can be traced back.
    fn indexed_iris() -> Vec<LandmarkPoint> {
        (0..IRIS_LANDMARK_COUNT)
            .map(|i| LandmarkPoint::new(i as f32, 0.0))
            .collect()
    }

    #[test]
    fn test_split_uses_fixed_mapping() {
        let iris = IrisLandmarks::from_slice(&indexed_iris()).unwrap();
        let (left, right) = iris.split();

        let left_idx: Vec<usize> = left.points().iter().map(|p| p.x as usize).collect();
        let right_idx: Vec<usize> = right.points().iter().map(|p| p.x as usize).collect();
        assert_eq!(left_idx, vec![0, 2, 4, 3, 1]);
        assert_eq!(right_idx, vec![5, 7, 9, 6, 8]);
    }

    #[test]
    fn test_split_covers_every_index_once() {
        let iris = IrisLandmarks::from_slice(&indexed_iris()).unwrap();
        let (left, right) = iris.split();

        let mut seen: Vec<usize> = left
            .points()
            .iter()
            .chain(right.points().iter())
            .map(|p| p.x as usize)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..IRIS_LANDMARK_COUNT).collect::<Vec<_>>());
    }

    #[test]
    fn test_wrong_iris_count_rejected() {
        let nine = &indexed_iris()[..9];
        let err = IrisLandmarks::from_slice(nine).unwrap_err();
        assert_eq!(err, ProcessError::IrisLandmarkCount(9));

        let mut eleven = indexed_iris();
        eleven.push(LandmarkPoint::default());
        assert!(IrisLandmarks::from_slice(&eleven).is_err());
    }

    #[test]
    fn test_zero_image_size_rejected() {
        assert!(ImageSize::new(640, 480).is_ok());
        assert!(matches!(
            ImageSize::new(0, 480),
            Err(ProcessError::InvalidImageSize { width: 0, .. })
        ));
        assert!(ImageSize::new(640, 0).is_err());
    }

    #[test]
    fn test_canthi_read_fixed_indices() {
        let face: Vec<LandmarkPoint> = (0..MIN_FACE_LANDMARKS)
            .map(|i| LandmarkPoint::new(i as f32, 0.0))
            .collect();
        let canthi = Canthi::from_face(&face).unwrap();
        assert_eq!(canthi.left.outer.x as usize, 33);
        assert_eq!(canthi.left.inner.x as usize, 133);
        assert_eq!(canthi.right.inner.x as usize, 362);
        assert_eq!(canthi.right.outer.x as usize, 263);

        let order: Vec<usize> = canthi.overlay_points().iter().map(|p| p.x as usize).collect();
        assert_eq!(order, vec![263, 362, 133, 33]);
    }

    #[test]
    fn test_short_face_rejected() {
        let face = vec![LandmarkPoint::default(); 300];
        let err = Canthi::from_face(&face).unwrap_err();
        assert_eq!(
            err,
            ProcessError::FaceLandmarkCount {
                len: 300,
                required: MIN_FACE_LANDMARKS
            }
        );
    }

    #[test]
    fn test_landmark_ignores_extra_fields() {
        let p: LandmarkPoint = serde_json::from_str(r#"{"x":0.25,"y":0.5,"z":-0.1}"#).unwrap();
        assert_eq!(p, LandmarkPoint::new(0.25, 0.5));
    }
}
