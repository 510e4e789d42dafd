//! Settings management

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use toydo_core::config::{LayoutMode, Tuning};
use toydo_core::math::Bounds;
use tracing::info;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("canvas must have a positive size, got {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },
}

/// Host settings for the canvas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Persisted presentation mode.
    pub mode: LayoutMode,
    pub canvas: CanvasSettings,
    pub tuning: Tuning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        // Portrait phone.
        Self {
            width: 390.0,
            height: 844.0,
        }
    }
}

impl CanvasSettings {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        info!(path = %path.display(), mode = ?settings.mode, "settings loaded");
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.canvas.bounds().is_valid() {
            return Err(SettingsError::InvalidCanvas {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_settings_override_fields() {
        let settings = Settings::from_json(
            r#"{ "mode": "block", "canvas": { "width": 844 }, "tuning": { "seed": 7 } }"#,
        )
        .unwrap();
        assert_eq!(settings.mode, LayoutMode::Block);
        assert_eq!(settings.canvas.width, 844.0);
        assert_eq!(settings.canvas.height, 844.0);
        assert_eq!(settings.tuning.seed, 7);
        assert_eq!(settings.tuning.target_fps, Tuning::default().target_fps);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Parse(_))));
        assert!(matches!(
            Settings::from_json(r#"{ "canvas": { "width": 0, "height": 10 } }"#),
            Err(SettingsError::InvalidCanvas { .. })
        ));
        assert!(matches!(Settings::load("/definitely/not/here.json"), Err(SettingsError::Io(_))));
    }

    #[test]
    fn defaults_to_a_portrait_bubble_canvas() {
        let settings = Settings::default();
        assert_eq!(settings.mode, LayoutMode::Bubble);
        assert_eq!((settings.canvas.width, settings.canvas.height), (390.0, 844.0));
        assert_eq!(settings.tuning, Tuning::default());
    }

    #[test]
    fn round_trips_through_json() {
        let settings = Settings {
            mode: LayoutMode::Block,
            ..Settings::default()
        };
        assert_eq!(Settings::from_json(&settings.to_json().unwrap()).unwrap(), settings);
    }
}
