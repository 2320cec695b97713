//! Ocula core — ocular alignment diagnostics from iris and face landmarks.
//!
//! A session consumes one frame of normalized landmarks at a time and
//! returns overlay primitives for the renderer together with running
//! diagnostics: iris size, canthus-to-iris distances in millimetres,
//! deltas against a one-shot baseline, and threshold-crossing counters.
//!
//! The crate does no I/O. Landmark detection, scheduling and rasterization
//! belong to the host.

pub mod baseline;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod options;
pub mod overlay;
pub mod processor;
pub mod smoothing;
pub mod state;

pub use baseline::{Baseline, DeltaReport, WarningCounters};
pub use error::ProcessError;
pub use geometry::DepthEstimator;
pub use landmarks::{Canthi, EyeLandmarks, ImageSize, IrisLandmarks, LandmarkPoint};
pub use options::{Color, OverlayOptions, SessionOptions, TextLocation};
pub use overlay::RenderPrimitive;
pub use processor::{Frame, FrameOutput, FrameProcessor, IrisSession};
pub use state::{FilterState, FrameDiagnostics};

/// Average adult iris diameter, used as the physical ruler.
pub const IRIS_DIAMETER_MM: f32 = 11.8;

/// Scale applied to the nasal-minus-temporal shift when forming a delta.
pub const DELTA_ADJUST_MM: f32 = 4.0;

/// A delta strictly above this counts as a misalignment warning.
pub const STRABISMUS_THRESHOLD_MM: f32 = 6.0;

/// Weight given to each new observation by the smoothing filters.
pub const EMA_WEIGHT: f32 = 0.1;
