use serde::{Deserialize, Serialize};

use crate::baseline::{Baseline, DeltaReport, Distances, WarningCounters};
use crate::landmarks::{Canthi, ImageSize, LandmarkPoint};
use crate::smoothing::{self, DistanceFilter, Ema, MmScale, PerEye};

/// Everything a session remembers between frames.
///
/// Owned by exactly one session and dropped with it. Serializable so hosts
/// can snapshot it for inspection; it is never restored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Smoothed larger-of-both-eyes iris diameter, in pixels.
    pub iris_size_px: Ema,
    /// Smoothed eye distances, in millimetres.
    pub distances: DistanceFilter,
    pub baseline: Baseline,
    pub warnings: WarningCounters,
}

/// Per-frame measurements needed to advance the filter.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub iris_diameter_px: PerEye<f32>,
    pub iris_center: PerEye<LandmarkPoint>,
    pub canthi: Canthi,
    pub image_size: ImageSize,
}

/// Result of one diagnostic update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDiagnostics {
    /// Smoothed iris diameter in pixels.
    pub iris_size_px: f32,
    /// Each eye's raw iris diameter converted to millimetres.
    pub iris_size_mm: PerEye<f32>,
    /// Smoothed distances in millimetres.
    pub distances: Distances,
    /// `None` until a baseline exists before this frame.
    pub deltas: Option<DeltaReport>,
    pub warnings: WarningCounters,
    /// Whether this frame captured the baseline.
    pub baseline_captured: bool,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the filters with one frame.
    ///
    /// Returns `None` (and leaves the state untouched) when neither eye has a
    /// positive iris diameter.
    pub fn observe(&mut self, obs: &Observation) -> Option<FrameDiagnostics> {
        let raw_iris = obs.iris_diameter_px.left.max(obs.iris_diameter_px.right);
        if raw_iris.is_nan() || raw_iris <= 0.0 {
            tracing::debug!(raw_iris, "skipping diagnostics: degenerate iris size");
            return None;
        }
        let iris_px = self.iris_size_px.update(raw_iris)?;

        let scale = MmScale::from_iris(iris_px, obs.image_size);
        let raw = PerEye {
            left: smoothing::measure_eye(obs.canthi.left, obs.iris_center.left, scale),
            right: smoothing::measure_eye(obs.canthi.right, obs.iris_center.right, scale),
        };
        smoothing::update_distances(&mut self.distances, &raw);
        let distances = smoothing::current_distances(&self.distances)?;
        // Coincident right canthi give a zero eye width; such a frame can
        // neither be compared against nor serve as the baseline.
        let usable = distances.right.width.combined > 0.0;

        let deltas = self
            .baseline
            .get()
            .filter(|_| usable)
            .map(|base| DeltaReport::compute(&distances, base));
        if let Some(deltas) = &deltas {
            let bumped = self.warnings.record(deltas);
            if bumped > 0 {
                tracing::warn!(
                    bumped,
                    total = self.warnings.total(),
                    cross_delta_mm = deltas.cross.combined,
                    "alignment delta above threshold"
                );
            }
        }

        // Captured after this frame's deltas, so the capture frame reports none.
        let baseline_captured = usable && self.baseline.capture(&distances);
        if baseline_captured {
            tracing::info!(
                left_width_mm = distances.left.width.combined,
                right_width_mm = distances.right.width.combined,
                "baseline captured"
            );
        }

        let mm_per_px = crate::IRIS_DIAMETER_MM / iris_px;
        Some(FrameDiagnostics {
            iris_size_px: iris_px,
            iris_size_mm: obs.iris_diameter_px.map(|d| d * mm_per_px),
            distances,
            deltas,
            warnings: self.warnings,
            baseline_captured,
        })
    }
}
