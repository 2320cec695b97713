//! Exponential smoothing of iris size and eye-geometry distances.
//!
//! Distances are measured between the two canthi and the iris center of each
//! eye, then rescaled by `IRIS_DIAMETER_MM / smoothed_iris_px` so that every
//! smoothed value is already in millimetre-equivalent units.

use serde::{Deserialize, Serialize};

use crate::landmarks::{EyeCorners, ImageSize, LandmarkPoint};
use crate::{EMA_WEIGHT, IRIS_DIAMETER_MM};

/// Exponential moving average over `f32` observations.
///
/// Starts unset. The first finite observation is taken verbatim; later ones
/// are blended in with [`EMA_WEIGHT`]. Non-finite observations are ignored,
/// so a set average is always finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ema(Option<f32>);

impl Ema {
    pub const fn unset() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<f32> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Fold in one observation and return the current average (if any).
    pub fn update(&mut self, raw: f32) -> Option<f32> {
        if !raw.is_finite() {
            return self.0;
        }
        let next = match self.0 {
            Some(prev) if prev.is_finite() => prev * (1.0 - EMA_WEIGHT) + raw * EMA_WEIGHT,
            _ => raw,
        };
        self.0 = Some(next);
        self.0
    }
}

/// A distance decomposed into its horizontal, vertical and combined forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes<T> {
    pub x: T,
    pub y: T,
    pub combined: T,
}

impl<T> Axes<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Axes<U> {
        Axes {
            x: f(self.x),
            y: f(self.y),
            combined: f(self.combined),
        }
    }

    pub fn zip<U>(self, other: Axes<U>) -> Axes<(T, U)> {
        Axes {
            x: (self.x, other.x),
            y: (self.y, other.y),
            combined: (self.combined, other.combined),
        }
    }
}

impl<T> Axes<Option<T>> {
    /// `Some` only when all three forms are present.
    pub fn transpose(self) -> Option<Axes<T>> {
        Some(Axes {
            x: self.x?,
            y: self.y?,
            combined: self.combined?,
        })
    }
}

/// The three eye distances tracked per eye.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeDistances<T> {
    /// Eye width: outer canthus to inner canthus ("a").
    pub width: Axes<T>,
    /// Outer canthus to iris center ("t").
    pub temporal: Axes<T>,
    /// Inner canthus to iris center ("n").
    pub nasal: Axes<T>,
}

impl<T> EyeDistances<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> EyeDistances<U> {
        EyeDistances {
            width: self.width.map(&mut f),
            temporal: self.temporal.map(&mut f),
            nasal: self.nasal.map(&mut f),
        }
    }

    pub fn zip<U>(self, other: EyeDistances<U>) -> EyeDistances<(T, U)> {
        EyeDistances {
            width: self.width.zip(other.width),
            temporal: self.temporal.zip(other.temporal),
            nasal: self.nasal.zip(other.nasal),
        }
    }
}

impl<T> EyeDistances<Option<T>> {
    pub fn transpose(self) -> Option<EyeDistances<T>> {
        Some(EyeDistances {
            width: self.width.transpose()?,
            temporal: self.temporal.transpose()?,
            nasal: self.nasal.transpose()?,
        })
    }
}

/// A left/right pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerEye<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerEye<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerEye<U> {
        PerEye {
            left: f(self.left),
            right: f(self.right),
        }
    }
}

/// Per-axis pixel-to-millimetre factors derived from the smoothed iris size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmScale {
    /// Millimetres per unit of normalized x.
    pub x: f32,
    /// Millimetres per unit of normalized y.
    pub y: f32,
}

impl MmScale {
    /// Scale for an image where the iris spans `iris_px` pixels.
    pub fn from_iris(iris_px: f32, size: ImageSize) -> Self {
        let ratio = IRIS_DIAMETER_MM / iris_px;
        Self {
            x: size.width as f32 * ratio,
            y: size.height as f32 * ratio,
        }
    }

    /// Distance between two landmarks, in millimetres.
    pub fn measure(&self, a: LandmarkPoint, b: LandmarkPoint) -> Axes<f32> {
        let x = (a.x - b.x).abs() * self.x;
        let y = (a.y - b.y).abs() * self.y;
        Axes {
            x,
            y,
            combined: (x * x + y * y).sqrt(),
        }
    }
}

/// Raw (unsmoothed) distances for one eye.
pub fn measure_eye(corners: EyeCorners, iris_center: LandmarkPoint, scale: MmScale) -> EyeDistances<f32> {
    EyeDistances {
        width: scale.measure(corners.outer, corners.inner),
        temporal: scale.measure(corners.outer, iris_center),
        nasal: scale.measure(corners.inner, iris_center),
    }
}

/// Smoothed state of the eighteen distance measurements.
pub type DistanceFilter = PerEye<EyeDistances<Ema>>;

/// Fold one frame of raw distances into the filter.
pub fn update_distances(filter: &mut DistanceFilter, raw: &PerEye<EyeDistances<f32>>) {
    update_eye(&mut filter.left, &raw.left);
    update_eye(&mut filter.right, &raw.right);
}

fn update_eye(filter: &mut EyeDistances<Ema>, raw: &EyeDistances<f32>) {
    update_axes(&mut filter.width, &raw.width);
    update_axes(&mut filter.temporal, &raw.temporal);
    update_axes(&mut filter.nasal, &raw.nasal);
}

fn update_axes(filter: &mut Axes<Ema>, raw: &Axes<f32>) {
    filter.x.update(raw.x);
    filter.y.update(raw.y);
    filter.combined.update(raw.combined);
}

/// Current smoothed distances, if every one of the eighteen averages is set.
pub fn current_distances(filter: &DistanceFilter) -> Option<PerEye<EyeDistances<f32>>> {
    Some(PerEye {
        left: filter.left.map(|e| e.value()).transpose()?,
        right: filter.right.map(|e| e.value()).transpose()?,
    })
}
