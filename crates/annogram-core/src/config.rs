//! Overlay configuration.

use crate::machine::ToggleVariant;
use crate::registry::PlacementStyle;
use crate::shapes::{SerializableColor, ShapeKind, TextGeometry};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Palette must contain at least one color")]
    EmptyPalette,
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// How pointer positions are reported to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Document coordinates (`pageX`/`pageY`).
    #[default]
    Page,
    /// Relative to the overlay surface's top-left corner.
    Container,
}

/// Colors offered by the menu when no palette is configured.
pub const DEFAULT_PALETTE: [SerializableColor; 5] = [
    SerializableColor::rgb(0, 0, 0),
    SerializableColor::rgb(239, 68, 68),
    SerializableColor::rgb(59, 130, 246),
    SerializableColor::rgb(34, 197, 94),
    SerializableColor::rgb(245, 158, 11),
];

/// Overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Number of states the toggle control cycles through.
    pub toggle: ToggleVariant,
    pub coordinates: CoordinateSpace,
    /// The surface is at least this tall, even on short pages.
    pub min_surface_height: f64,
    /// Shape type selected at startup.
    pub default_shape: ShapeKind,
    /// Colors offered by the menu. The first one is selected at startup.
    pub palette: Vec<SerializableColor>,
    pub stroke_width: f64,
    /// Size of new text boxes.
    pub text_size: Size,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            toggle: ToggleVariant::default(),
            coordinates: CoordinateSpace::default(),
            min_surface_height: 2000.0,
            default_shape: ShapeKind::default(),
            palette: DEFAULT_PALETTE.to_vec(),
            stroke_width: 2.0,
            text_size: TextGeometry::DEFAULT_SIZE,
        }
    }
}

impl OverlayConfig {
    /// Parse and validate a JSON configuration. Missing fields use defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.stroke_width.is_nan() || self.stroke_width <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "stroke_width",
                value: self.stroke_width,
            });
        }
        if self.min_surface_height.is_nan() || self.min_surface_height < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "min_surface_height",
                value: self.min_surface_height,
            });
        }
        for (field, value) in [
            ("text_size.width", self.text_size.width),
            ("text_size.height", self.text_size.height),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }

    /// Palette entry at `index`, falling back to black.
    pub fn color(&self, index: usize) -> SerializableColor {
        self.palette
            .get(index)
            .copied()
            .unwrap_or_else(SerializableColor::black)
    }

    /// Style for a shape placed with the palette color at `index`.
    pub fn placement_style(&self, index: usize) -> PlacementStyle {
        PlacementStyle {
            color: self.color(index),
            stroke_width: self.stroke_width,
            text_size: self.text_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.toggle, ToggleVariant::ThreeState);
        assert_eq!(config.min_surface_height, 2000.0);
        assert_eq!(config.palette.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = OverlayConfig::from_json(
            r#"{"toggle": "two-state", "default_shape": "rect", "coordinates": "container"}"#,
        )
        .unwrap();
        assert_eq!(config.toggle, ToggleVariant::TwoState);
        assert_eq!(config.default_shape, ShapeKind::Rect);
        assert_eq!(config.coordinates, CoordinateSpace::Container);
        assert_eq!(config.stroke_width, 2.0);
    }

    #[test]
    fn test_palette_and_sizes() {
        let config = OverlayConfig::from_json(
            r#"{"palette": [{"r": 1, "g": 2, "b": 3, "a": 255}], "text_size": {"width": 120.0, "height": 40.0}}"#,
        )
        .unwrap();
        assert_eq!(config.color(0), SerializableColor::rgb(1, 2, 3));
        assert_eq!(config.color(7), SerializableColor::black());
        let style = config.placement_style(0);
        assert_eq!(style.text_size, Size::new(120.0, 40.0));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            OverlayConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            OverlayConfig::from_json(r#"{"palette": []}"#),
            Err(ConfigError::EmptyPalette)
        ));
        assert!(matches!(
            OverlayConfig::from_json(r#"{"stroke_width": 0.0}"#),
            Err(ConfigError::InvalidValue { field: "stroke_width", .. })
        ));
    }
}
