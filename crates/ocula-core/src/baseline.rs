//! One-shot baseline capture, per-frame deltas and misalignment counters.
//!
//! A steady gaze shift of one eye moves its iris toward one canthus and away
//! from the other. Head motion moves both canthi with the iris and cancels
//! out of `(n − n₀) − (t − t₀)`. Comparing that per-eye shift between the two
//! eyes gives a cross-eye asymmetry signal used as a strabismus heuristic.

use serde::{Deserialize, Serialize};

use crate::smoothing::{Axes, EyeDistances, PerEye};
use crate::{DELTA_ADJUST_MM, STRABISMUS_THRESHOLD_MM};

/// Smoothed distances for both eyes.
pub type Distances = PerEye<EyeDistances<f32>>;

/// Calibration snapshot of the eighteen smoothed distances.
///
/// Written at most once per session; later captures are no-ops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Baseline(Option<Distances>);

impl Baseline {
    pub fn get(&self) -> Option<&Distances> {
        self.0.as_ref()
    }

    pub fn is_captured(&self) -> bool {
        self.0.is_some()
    }

    /// Store `current` if nothing has been captured yet. Returns whether the
    /// snapshot was taken by this call.
    pub fn capture(&mut self, current: &Distances) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(*current);
        true
    }
}

/// Deltas against the baseline, in millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub left: Axes<f32>,
    pub right: Axes<f32>,
    /// Left minus right.
    pub cross: Axes<f32>,
}

impl DeltaReport {
    pub fn compute(current: &Distances, baseline: &Distances) -> Self {
        let left = eye_delta(&current.left, &baseline.left);
        let right = eye_delta(&current.right, &baseline.right);
        let cross = left.zip(right).map(|(l, r)| l - r);
        Self { left, right, cross }
    }
}

fn eye_delta(current: &EyeDistances<f32>, baseline: &EyeDistances<f32>) -> Axes<f32> {
    let nasal_shift = current.nasal.zip(baseline.nasal).map(|(c, b)| c - b);
    let temporal_shift = current.temporal.zip(baseline.temporal).map(|(c, b)| c - b);
    nasal_shift
        .zip(temporal_shift)
        .map(|(n, t)| (n - t) * DELTA_ADJUST_MM / 2.0)
}

/// Nine monotonically increasing threshold-crossing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningCounters {
    pub left: Axes<u64>,
    pub right: Axes<u64>,
    pub cross: Axes<u64>,
}

impl WarningCounters {
    /// Count every delta strictly above the threshold. Returns how many
    /// counters were incremented.
    pub fn record(&mut self, deltas: &DeltaReport) -> usize {
        count_axes(&mut self.left, &deltas.left)
            + count_axes(&mut self.right, &deltas.right)
            + count_axes(&mut self.cross, &deltas.cross)
    }

    pub fn total(&self) -> u64 {
        [self.left, self.right, self.cross]
            .iter()
            .map(|a| a.x + a.y + a.combined)
            .sum()
    }
}

fn count_axes(counters: &mut Axes<u64>, deltas: &Axes<f32>) -> usize {
    let mut bumped = 0;
    for (counter, delta) in [
        (&mut counters.x, deltas.x),
        (&mut counters.y, deltas.y),
        (&mut counters.combined, deltas.combined),
    ] {
        if delta > STRABISMUS_THRESHOLD_MM {
            *counter += 1;
            bumped += 1;
        }
    }
    bumped
}
