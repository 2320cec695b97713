use thiserror::Error;

/// Upstream contract violations detected while processing a frame.
///
/// Every variant is fatal for the frame that raised it: the caller receives
/// the error instead of an output and decides whether to abort the stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("wrong number of iris landmarks: {0} (expected {expected})", expected = crate::landmarks::IRIS_LANDMARK_COUNT)]
    IrisLandmarkCount(usize),
    #[error("image size is required but was not supplied")]
    MissingImageSize,
    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
    #[error("face landmark list too short: {len} points, need at least {required}")]
    FaceLandmarkCount { len: usize, required: usize },
    #[error("frame timestamp {current} does not follow previous timestamp {previous}")]
    TimestampOrder { previous: i64, current: i64 },
}
