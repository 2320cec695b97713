use serde::{Deserialize, Serialize};

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Where the text block is anchored vertically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextLocation {
    /// First baseline one line below `vertical_offset_px`.
    #[default]
    TopLeft,
    /// Last line sits on the bottom edge, shifted by `vertical_offset_px`.
    BottomLeft,
    /// First baseline exactly at `vertical_offset_px`.
    Other,
}

impl std::str::FromStr for TextLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top_left" | "top-left" => Ok(Self::TopLeft),
            "bottom_left" | "bottom-left" => Ok(Self::BottomLeft),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown text location: {other}")),
        }
    }
}

/// Styling and placement for overlay primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    pub oval_color: Color,
    pub oval_thickness: f32,
    pub landmark_color: Color,
    pub landmark_thickness: f32,
    pub text_color: Color,
    pub text_thickness: f32,
    pub font_height_px: u32,
    pub horizontal_offset_px: i32,
    pub vertical_offset_px: i32,
    pub location: TextLocation,
    /// Renderer-specific font identifier.
    pub font_face: i32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            oval_color: Color::WHITE,
            oval_thickness: 2.0,
            landmark_color: Color::GREEN,
            landmark_thickness: 2.0,
            text_color: Color::RED,
            text_thickness: 2.0,
            font_height_px: 50,
            horizontal_offset_px: 200,
            vertical_offset_px: 200,
            location: TextLocation::TopLeft,
            font_face: 0,
        }
    }
}

/// Per-session configuration, fixed for the session's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Camera focal length in pixels. When set, per-eye depth is estimated
    /// for frames that do not supply it.
    pub focal_length_px: Option<f32>,
    pub overlay: OverlayOptions,
}
