//! Per-frame processing contract and the iris diagnostics session.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProcessError;
use crate::geometry::{self, DepthEstimator};
use crate::landmarks::{Canthi, ImageSize, IrisLandmarks, LandmarkPoint};
use crate::options::SessionOptions;
use crate::overlay::{OverlayBuilder, RenderPrimitive};
use crate::smoothing::PerEye;
use crate::state::{FilterState, FrameDiagnostics, Observation};

/// One frame's worth of upstream detections.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Frame {
    /// Presentation timestamp, microseconds. Strictly increasing per session.
    pub timestamp_us: i64,
    #[serde(default)]
    pub iris: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub face: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub image_size: Option<ImageSize>,
    #[serde(default, deserialize_with = "depth_mm")]
    pub left_iris_depth_mm: Option<f32>,
    #[serde(default, deserialize_with = "depth_mm")]
    pub right_iris_depth_mm: Option<f32>,
}

/// Depth values arrive as numbers, or as `"inf"` / `"-inf"` when the producer
/// knows the depth is undefined (JSON has no infinity literal).
fn depth_mm<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "inf" | "+inf" | "infinity" | "+infinity" => Ok(Some(f32::INFINITY)),
            "-inf" | "-infinity" => Ok(Some(f32::NEG_INFINITY)),
            other => Err(serde::de::Error::custom(format!(
                "invalid depth value: {other}"
            ))),
        },
    }
}

/// Everything produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    /// Copied from the triggering frame.
    pub timestamp_us: i64,
    pub primitives: Vec<RenderPrimitive>,
    /// Present when face landmarks allowed the diagnostic update to run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<FrameDiagnostics>,
}

/// Typed per-frame processing step, invoked once per frame in timestamp order.
pub trait FrameProcessor {
    /// Returns `Ok(None)` when the frame carries nothing to process.
    fn process(&mut self, frame: &Frame) -> Result<Option<FrameOutput>, ProcessError>;
}

/// A single tracked face: options plus the filter state that evolves with it.
pub struct IrisSession {
    options: SessionOptions,
    depth: Option<DepthEstimator>,
    state: FilterState,
    last_timestamp_us: Option<i64>,
}

impl IrisSession {
    pub fn new(options: SessionOptions) -> Self {
        let depth = options.focal_length_px.map(DepthEstimator::new);
        Self {
            options,
            depth,
            state: FilterState::new(),
            last_timestamp_us: None,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    fn check_timestamp(&mut self, current: i64) -> Result<(), ProcessError> {
        if let Some(previous) = self.last_timestamp_us {
            if current <= previous {
                return Err(ProcessError::TimestampOrder { previous, current });
            }
        }
        self.last_timestamp_us = Some(current);
        Ok(())
    }
}

impl FrameProcessor for IrisSession {
    fn process(&mut self, frame: &Frame) -> Result<Option<FrameOutput>, ProcessError> {
        self.check_timestamp(frame.timestamp_us)?;

        let Some(raw_iris) = frame.iris.as_deref() else {
            tracing::trace!(ts = frame.timestamp_us, "no iris landmarks; skipping frame");
            return Ok(None);
        };
        let iris = IrisLandmarks::from_slice(raw_iris)?;
        let image_size = frame
            .image_size
            .ok_or(ProcessError::MissingImageSize)?
            .validated()?;
        let canthi = frame.face.as_deref().map(Canthi::from_face).transpose()?;

        let (left, right) = iris.split();
        let diameter = PerEye {
            left: geometry::iris_diameter_px(&left, image_size),
            right: geometry::iris_diameter_px(&right, image_size),
        };

        let mut overlay = OverlayBuilder::new(&self.options.overlay, image_size);
        overlay.add_iris(&left, diameter.left);
        overlay.add_iris(&right, diameter.right);

        let left_depth = frame.left_iris_depth_mm.or_else(|| {
            self.depth
                .map(|d| d.estimate_mm(left.center, diameter.left, image_size))
        });
        let right_depth = frame.right_iris_depth_mm.or_else(|| {
            self.depth
                .map(|d| d.estimate_mm(right.center, diameter.right, image_size))
        });
        overlay.add_depth_lines(left_depth, right_depth);

        let mut diagnostics = None;
        if let Some(canthi) = canthi {
            overlay.add_canthi(&canthi);
            diagnostics = self.state.observe(&Observation {
                iris_diameter_px: diameter,
                iris_center: PerEye {
                    left: left.center,
                    right: right.center,
                },
                canthi,
                image_size,
            });
            if let Some(diag) = &diagnostics {
                overlay.add_diagnostic_lines(diag);
            }
        }

        tracing::debug!(
            ts = frame.timestamp_us,
            left_iris_px = diameter.left,
            right_iris_px = diameter.right,
            diagnostics = diagnostics.is_some(),
            "frame processed"
        );

        Ok(Some(FrameOutput {
            timestamp_us: frame.timestamp_us,
            primitives: overlay.finish(),
            diagnostics,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iris_points() -> Vec<LandmarkPoint> {
        let eye = |cx: f32| {
            [
                LandmarkPoint::new(cx, 0.5),
                LandmarkPoint::new(cx + 0.02, 0.5),
                LandmarkPoint::new(cx, 0.48),
                LandmarkPoint::new(cx - 0.02, 0.5),
                LandmarkPoint::new(cx, 0.52),
            ]
        };
        eye(0.4).into_iter().chain(eye(0.6)).collect()
    }

    fn frame(ts: i64) -> Frame {
        Frame {
            timestamp_us: ts,
            iris: Some(iris_points()),
            image_size: Some(ImageSize {
                width: 640,
                height: 480,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_frame_yields_nothing() {
        let mut session = IrisSession::new(SessionOptions::default());
        let out = session
            .process(&Frame {
                timestamp_us: 1,
                ..Default::default()
            })
            .unwrap();
        assert!(out.is_none());
        assert_eq!(session.state(), &FilterState::default());
    }

    #[test]
    fn test_timestamps_must_increase() {
        let mut session = IrisSession::new(SessionOptions::default());
        session.process(&frame(10)).unwrap();
        let err = session.process(&frame(10)).unwrap_err();
        assert_eq!(
            err,
            ProcessError::TimestampOrder {
                previous: 10,
                current: 10
            }
        );
    }

    #[test]
    fn test_missing_image_size_is_fatal() {
        let mut session = IrisSession::new(SessionOptions::default());
        let mut f = frame(1);
        f.image_size = None;
        assert_eq!(session.process(&f).unwrap_err(), ProcessError::MissingImageSize);
    }

    #[test]
    fn test_zero_image_size_is_fatal() {
        let mut session = IrisSession::new(SessionOptions::default());
        let mut f = frame(1);
        f.image_size = Some(ImageSize {
            width: 0,
            height: 480,
        });
        assert!(matches!(
            session.process(&f),
            Err(ProcessError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn test_focal_length_estimates_depth() {
        let mut session = IrisSession::new(SessionOptions {
            focal_length_px: Some(1000.0),
            ..Default::default()
        });
        let out = session.process(&frame(1)).unwrap().unwrap();
        let texts: Vec<&str> = out.primitives.iter().filter_map(|p| p.text()).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("Left : "));
        assert!(texts[1].starts_with("Right : "));
    }

    #[test]
    fn test_supplied_depth_wins_over_estimate() {
        let mut session = IrisSession::new(SessionOptions {
            focal_length_px: Some(1000.0),
            ..Default::default()
        });
        let mut f = frame(1);
        f.left_iris_depth_mm = Some(f32::INFINITY);
        f.right_iris_depth_mm = Some(612.0);
        let out = session.process(&f).unwrap().unwrap();
        let texts: Vec<&str> = out.primitives.iter().filter_map(|p| p.text()).collect();
        assert_eq!(texts, vec!["Right : 61 cm"]);
    }

    #[test]
    fn test_depth_accepts_inf_string() {
        let f: Frame = serde_json::from_str(
            r#"{"timestamp_us":5,"left_iris_depth_mm":"inf","right_iris_depth_mm":430.5}"#,
        )
        .unwrap();
        assert_eq!(f.left_iris_depth_mm, Some(f32::INFINITY));
        assert_eq!(f.right_iris_depth_mm, Some(430.5));
        assert!(f.iris.is_none());

        let bad = serde_json::from_str::<Frame>(r#"{"timestamp_us":5,"left_iris_depth_mm":"far"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_negative_infinite_depth_is_unknown() {
        let parsed: Frame = serde_json::from_str(
            r#"{"timestamp_us":5,"left_iris_depth_mm":"-inf","right_iris_depth_mm":"-Infinity"}"#,
        )
        .unwrap();
        assert_eq!(parsed.left_iris_depth_mm, Some(f32::NEG_INFINITY));
        assert_eq!(parsed.right_iris_depth_mm, Some(f32::NEG_INFINITY));

        let mut session = IrisSession::new(SessionOptions::default());
        let f = Frame {
            left_iris_depth_mm: parsed.left_iris_depth_mm,
            right_iris_depth_mm: parsed.right_iris_depth_mm,
            ..frame(5)
        };
        let out = session.process(&f).unwrap().unwrap();
        assert_eq!(out.primitives.iter().filter_map(|p| p.text()).count(), 0);
    }
}
