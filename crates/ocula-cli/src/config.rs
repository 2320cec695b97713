use std::path::Path;

use anyhow::{Context, Result};
use ocula_core::{SessionOptions, TextLocation};
use serde::{Deserialize, Serialize};

/// Host configuration: session options plus engine plumbing.
///
/// Loaded from an optional TOML file, then overridden by `OCULA_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Depth of the request queue between the reader and the session thread.
    pub channel_capacity: usize,
    pub session: SessionOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            session: SessionOptions::default(),
        }
    }
}

impl Config {
    /// Load the file at `path` (if any), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `OCULA_*` overrides from `lookup`. Unparseable values are logged
    /// and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overlay = &mut self.session.overlay;

        if let Some(v) = env_parse::<f32>(&lookup, "OCULA_FOCAL_LENGTH_PX") {
            self.session.focal_length_px = (v > 0.0).then_some(v);
        }
        if let Some(v) = env_parse(&lookup, "OCULA_FONT_HEIGHT_PX") {
            overlay.font_height_px = v;
        }
        if let Some(v) = env_parse(&lookup, "OCULA_HORIZONTAL_OFFSET_PX") {
            overlay.horizontal_offset_px = v;
        }
        if let Some(v) = env_parse(&lookup, "OCULA_VERTICAL_OFFSET_PX") {
            overlay.vertical_offset_px = v;
        }
        if let Some(v) = env_parse::<TextLocation>(&lookup, "OCULA_TEXT_LOCATION") {
            overlay.location = v;
        }
        if let Some(v) = env_parse::<usize>(&lookup, "OCULA_CHANNEL_CAPACITY") {
            self.channel_capacity = v.max(1);
        }
    }
}

fn env_parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
