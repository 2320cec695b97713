//! Render primitives for the iris overlay and the diagnostic text block.

use serde::Serialize;

use crate::landmarks::{Canthi, EyeLandmarks, ImageSize, LandmarkPoint};
use crate::options::{Color, OverlayOptions, TextLocation};
use crate::smoothing::Axes;
use crate::state::FrameDiagnostics;
use crate::{DELTA_ADJUST_MM, IRIS_DIAMETER_MM, STRABISMUS_THRESHOLD_MM};

/// Scene tag attached to iris ovals.
pub const OVAL_SCENE_TAG: &str = "OVAL";

/// Line height as a multiple of the font height.
const FONT_HEIGHT_SCALE: f32 = 1.5;

/// Axis-aligned rectangle in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Style {
    pub color: Color,
    pub thickness: f32,
}

/// A line of text anchored in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub display_text: String,
    pub font_height: u32,
    pub left: i32,
    pub baseline: i32,
    pub font_face: i32,
}

/// One drawable item handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderPrimitive {
    Oval {
        scene_tag: &'static str,
        rect: NormalizedRect,
        style: Style,
    },
    Point {
        point: LandmarkPoint,
        style: Style,
    },
    Text {
        label: TextLabel,
        style: Style,
    },
}

impl RenderPrimitive {
    /// Display string of a text primitive.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { label, .. } => Some(&label.display_text),
            _ => None,
        }
    }
}

/// Accumulates geometry primitives and text lines for one frame.
pub struct OverlayBuilder<'a> {
    options: &'a OverlayOptions,
    image_size: ImageSize,
    primitives: Vec<RenderPrimitive>,
    lines: Vec<String>,
}

impl<'a> OverlayBuilder<'a> {
    pub fn new(options: &'a OverlayOptions, image_size: ImageSize) -> Self {
        Self {
            options,
            image_size,
            primitives: Vec::with_capacity(16),
            lines: Vec::new(),
        }
    }

    fn landmark_style(&self) -> Style {
        Style {
            color: self.options.landmark_color,
            thickness: self.options.landmark_thickness,
        }
    }

    fn push_point(&mut self, point: LandmarkPoint) {
        let style = self.landmark_style();
        self.primitives.push(RenderPrimitive::Point { point, style });
    }

    /// Oval around the iris plus its five landmark points.
    pub fn add_iris(&mut self, eye: &EyeLandmarks, diameter_px: f32) {
        let radius = diameter_px / 2.0;
        let rx = radius / self.image_size.width as f32;
        let ry = radius / self.image_size.height as f32;
        let c = eye.center;
        self.primitives.push(RenderPrimitive::Oval {
            scene_tag: OVAL_SCENE_TAG,
            rect: NormalizedRect {
                left: c.x - rx,
                top: c.y - ry,
                right: c.x + rx,
                bottom: c.y + ry,
            },
            style: Style {
                color: self.options.oval_color,
                thickness: self.options.oval_thickness,
            },
        });
        for point in eye.points() {
            self.push_point(point);
        }
    }

    /// The four eye-corner points.
    pub fn add_canthi(&mut self, canthi: &Canthi) {
        for point in canthi.overlay_points() {
            self.push_point(point);
        }
    }

    /// `Left : N cm` / `Right : N cm`, skipping absent or infinite depths.
    pub fn add_depth_lines(&mut self, left_mm: Option<f32>, right_mm: Option<f32>) {
        for (side, depth) in [("Left", left_mm), ("Right", right_mm)] {
            if let Some(mm) = depth.filter(|d| !d.is_infinite()) {
                self.lines.push(format!("{side} : {:.0} cm", (mm / 10.0).round()));
            }
        }
    }

    pub fn add_diagnostic_lines(&mut self, diag: &FrameDiagnostics) {
        self.lines.extend(diagnostic_lines(diag));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lay out the text block and return every primitive in draw order.
    pub fn finish(mut self) -> Vec<RenderPrimitive> {
        let text = layout_text(&self.lines, self.image_size, self.options);
        self.primitives.extend(text);
        self.primitives
    }
}

/// Turn text lines into anchored text primitives.
pub fn layout_text(lines: &[String], image_size: ImageSize, options: &OverlayOptions) -> Vec<RenderPrimitive> {
    let line_height = (options.font_height_px as f32 * FONT_HEIGHT_SCALE).ceil() as i32;
    let mut first_baseline = options.vertical_offset_px;
    match options.location {
        TextLocation::TopLeft => first_baseline = first_baseline.saturating_add(line_height),
        TextLocation::BottomLeft => {
            let block = line_height.saturating_mul(lines.len() as i32);
            first_baseline = first_baseline.saturating_add((image_size.height as i32).saturating_sub(block));
        }
        TextLocation::Other => {}
    }

    let style = Style {
        color: options.text_color,
        thickness: options.text_thickness,
    };
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| RenderPrimitive::Text {
            label: TextLabel {
                display_text: line.clone(),
                font_height: options.font_height_px,
                left: options.horizontal_offset_px,
                baseline: first_baseline.saturating_add((i as i32).saturating_mul(line_height)),
                font_face: options.font_face,
            },
            style,
        })
        .collect()
}

// ── Text formatting ───────────────────────────────────────────────────────────

fn fmt_mm(a: &Axes<f32>) -> String {
    format!("d{:5.1}, x{:5.1}, y{:5.1}", a.combined, a.x, a.y)
}

fn fmt_delta(a: Option<&Axes<f32>>) -> String {
    match a {
        Some(a) => format!("{} mm", fmt_mm(a)),
        None => "--".to_string(),
    }
}

fn fmt_count(a: &Axes<u64>) -> String {
    format!("d{}, x{}, y{}", a.combined, a.x, a.y)
}

/// The diagnostic text block: left eye, right eye, then aggregates.
pub fn diagnostic_lines(diag: &FrameDiagnostics) -> Vec<String> {
    let mut lines = Vec::with_capacity(16);
    let sides = [
        (
            "left",
            diag.iris_size_mm.left,
            &diag.distances.left,
            diag.deltas.as_ref().map(|d| &d.left),
            &diag.warnings.left,
        ),
        (
            "right",
            diag.iris_size_mm.right,
            &diag.distances.right,
            diag.deltas.as_ref().map(|d| &d.right),
            &diag.warnings.right,
        ),
    ];
    for (side, iris_mm, dist, delta, count) in sides {
        lines.push(format!("{side} iris size : {iris_mm:5.1} mm"));
        lines.push(format!("{side} ab : {} mm", fmt_mm(&dist.width)));
        lines.push(format!("{side} tb : {} mm", fmt_mm(&dist.temporal)));
        lines.push(format!("{side} nb : {} mm", fmt_mm(&dist.nasal)));
        lines.push(format!("{side} delta : {}", fmt_delta(delta)));
        lines.push(format!("{side} count : {}", fmt_count(count)));
    }

    // Rescaled through the same iris ratio as the distances.
    let iris_mm = diag.iris_size_px * (IRIS_DIAMETER_MM / diag.iris_size_px);
    lines.push(format!("iris  : {iris_mm:5.1} mm"));
    lines.push(format!(
        "delta : {}",
        fmt_delta(diag.deltas.as_ref().map(|d| &d.cross))
    ));
    lines.push(format!("count : {}", fmt_count(&diag.warnings.cross)));
    lines.push(format!(
        "const : iris {IRIS_DIAMETER_MM:5.1}, calc {DELTA_ADJUST_MM:5.1}, delta {STRABISMUS_THRESHOLD_MM:5.1} mm"
    ));
    lines
}
