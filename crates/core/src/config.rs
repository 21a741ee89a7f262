//! Annotator configuration
//!
//! Every tunable dimension of placement, rendering, and signature capture in
//! one place. Configuration can be loaded from a JSON file, environment
//! variables, or created programmatically.

use crate::annotation::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the annotation engine.
///
/// Dimensions suffixed `_px` are screen pixels and do not scale with zoom.
/// Everything else is in document units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Lowest zoom scale
    pub min_scale: f32,
    /// Highest zoom scale
    pub max_scale: f32,
    /// Zoom in/out increment
    pub zoom_step: f32,
    /// Highlight/underline width when placed without a drag
    pub default_region_width: f32,
    /// Highlight height when placed without a drag
    pub default_region_height: f32,
    /// Minimum pointer travel (screen px) before a press counts as a drag
    pub drag_threshold_px: f32,
    pub underline_thickness_px: f32,
    pub underline_offset_px: f32,
    /// Highlight fill opacity (0.0 to 1.0)
    pub highlight_opacity: f32,
    pub comment_marker_px: f32,
    /// Box the signature's natural size is fitted into before scaling
    pub signature_max_width: f32,
    pub signature_max_height: f32,
    pub delete_handle_px: f32,
    /// Stroke color selected when a session starts
    pub default_color: Color,
    pub signature_pad: SignaturePadConfig,
}

/// Drawing surface settings for signature capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePadConfig {
    pub width: u32,
    pub height: u32,
    pub pen_color: Color,
    pub pen_width: f32,
}

impl Default for SignaturePadConfig {
    fn default() -> Self {
        Self { width: 500, height: 200, pen_color: Color::BLACK, pen_width: 2.5 }
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            zoom_step: 0.1,
            default_region_width: 100.0,
            default_region_height: 20.0,
            drag_threshold_px: 2.0,
            underline_thickness_px: 3.0,
            underline_offset_px: 18.0,
            highlight_opacity: 0.4,
            comment_marker_px: 32.0,
            signature_max_width: 200.0,
            signature_max_height: 100.0,
            delete_handle_px: 16.0,
            default_color: Color::YELLOW,
            signature_pad: SignaturePadConfig::default(),
        }
    }
}

impl AnnotatorConfig {
    /// Sets the zoom bounds. The pair is stored lowest first.
    pub fn with_scale_bounds(mut self, min: f32, max: f32) -> Self {
        self.min_scale = min.min(max);
        self.max_scale = min.max(max);
        self
    }

    /// Sets the default region used for clicks without a drag.
    pub fn with_default_region(mut self, width: f32, height: f32) -> Self {
        self.default_region_width = width;
        self.default_region_height = height;
        self
    }

    /// Sets the drag threshold in screen pixels.
    pub fn with_drag_threshold(mut self, px: f32) -> Self {
        self.drag_threshold_px = px;
        self
    }

    /// Sets the stroke color selected at session start.
    pub fn with_default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    /// Sets the signature pad surface size.
    pub fn with_signature_pad(mut self, width: u32, height: u32) -> Self {
        self.signature_pad.width = width;
        self.signature_pad.height = height;
        self
    }

    /// Zoom bounds as an ordered `(min, max)` pair.
    ///
    /// Bounds that are not finite and positive fall back to the defaults, so
    /// the result is always usable for clamping even before [`Self::validate`].
    pub fn scale_bounds(&self) -> (f32, f32) {
        let usable = |value: f32, fallback: f32| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let min = usable(self.min_scale, DEFAULT_MIN_SCALE);
        let max = usable(self.max_scale, DEFAULT_MAX_SCALE);
        (min.min(max), min.max(max))
    }

    /// Clamps a zoom scale into the configured bounds.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        let (min, max) = self.scale_bounds();
        if scale.is_nan() {
            return min;
        }
        scale.clamp(min, max)
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - `PDF_SIGNER_MIN_SCALE`: lowest zoom scale (default: 0.5)
    /// - `PDF_SIGNER_MAX_SCALE`: highest zoom scale (default: 2.0)
    /// - `PDF_SIGNER_DEFAULT_COLOR`: starting stroke color as `#RRGGBB`
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Applies environment overrides to an existing configuration.
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("PDF_SIGNER_MIN_SCALE") {
            self.min_scale = parse_scale("PDF_SIGNER_MIN_SCALE", &val)?;
        }

        if let Ok(val) = std::env::var("PDF_SIGNER_MAX_SCALE") {
            self.max_scale = parse_scale("PDF_SIGNER_MAX_SCALE", &val)?;
        }

        if let Ok(val) = std::env::var("PDF_SIGNER_DEFAULT_COLOR") {
            self.default_color = val
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PDF_SIGNER_DEFAULT_COLOR".to_string()))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a JSON file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Checks every value for consistency.
    ///
    /// Files and environment overrides are validated on load; call this for
    /// configurations assembled in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(ConfigError::InvalidValue("min_scale/max_scale".to_string()));
        }
        if !self.max_scale.is_finite() {
            return Err(ConfigError::InvalidValue("max_scale".to_string()));
        }
        require_positive("zoom_step", self.zoom_step)?;
        require_positive("default_region_width", self.default_region_width)?;
        require_positive("default_region_height", self.default_region_height)?;
        require_non_negative("drag_threshold_px", self.drag_threshold_px)?;
        require_positive("underline_thickness_px", self.underline_thickness_px)?;
        require_non_negative("underline_offset_px", self.underline_offset_px)?;
        if !(0.0..=1.0).contains(&self.highlight_opacity) {
            return Err(ConfigError::InvalidValue("highlight_opacity".to_string()));
        }
        require_positive("comment_marker_px", self.comment_marker_px)?;
        require_positive("signature_max_width", self.signature_max_width)?;
        require_positive("signature_max_height", self.signature_max_height)?;
        require_positive("delete_handle_px", self.delete_handle_px)?;
        if self.signature_pad.width == 0 || self.signature_pad.height == 0 {
            return Err(ConfigError::InvalidValue("signature_pad".to_string()));
        }
        require_positive("signature_pad.pen_width", self.signature_pad.pen_width)?;
        Ok(())
    }
}

const DEFAULT_MIN_SCALE: f32 = 0.5;
const DEFAULT_MAX_SCALE: f32 = 2.0;

fn require_positive(key: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(key.to_string()))
    }
}

fn require_non_negative(key: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(key.to_string()))
    }
}

fn parse_scale(key: &str, value: &str) -> Result<f32, ConfigError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|scale| scale.is_finite() && *scale > 0.0)
        .ok_or_else(|| ConfigError::InvalidValue(key.to_string()))
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    /// I/O error reading or writing configuration file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    const ENV_KEYS: [&str; 3] =
        ["PDF_SIGNER_MIN_SCALE", "PDF_SIGNER_MAX_SCALE", "PDF_SIGNER_DEFAULT_COLOR"];

    #[test]
    fn test_default_config() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.min_scale, 0.5);
        assert_eq!(config.max_scale, 2.0);
        assert_eq!(config.default_region_width, 100.0);
        assert_eq!(config.default_region_height, 20.0);
        assert_eq!(config.default_color, Color::YELLOW);
        assert_eq!(config.signature_pad.width, 500);
        assert_eq!(config.signature_pad.height, 200);
    }

    #[test]
    fn test_builder_methods() {
        let config = AnnotatorConfig::default()
            .with_scale_bounds(0.25, 4.0)
            .with_default_region(80.0, 12.0)
            .with_drag_threshold(5.0)
            .with_default_color(Color::BLUE)
            .with_signature_pad(300, 120);

        assert_eq!(config.min_scale, 0.25);
        assert_eq!(config.max_scale, 4.0);
        assert_eq!(config.default_region_width, 80.0);
        assert_eq!(config.drag_threshold_px, 5.0);
        assert_eq!(config.default_color, Color::BLUE);
        assert_eq!(config.signature_pad.height, 120);
    }

    #[test]
    fn test_clamp_scale() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.clamp_scale(0.1), 0.5);
        assert_eq!(config.clamp_scale(1.3), 1.3);
        assert_eq!(config.clamp_scale(9.0), 2.0);
        assert_eq!(config.clamp_scale(f32::NAN), 0.5);
    }

    #[test]
    fn test_reversed_scale_bounds_are_ordered() {
        let config = AnnotatorConfig::default().with_scale_bounds(2.0, 0.5);
        assert_eq!((config.min_scale, config.max_scale), (0.5, 2.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_scale_survives_inconsistent_fields() {
        let config = AnnotatorConfig { min_scale: 3.0, max_scale: 1.0, ..Default::default() };
        assert!(config.validate().is_err());
        assert_eq!(config.scale_bounds(), (1.0, 3.0));
        assert_eq!(config.clamp_scale(0.2), 1.0);

        let config = AnnotatorConfig { min_scale: f32::NAN, max_scale: -1.0, ..Default::default() };
        assert_eq!(config.scale_bounds(), (0.5, 2.0));
        assert_eq!(config.clamp_scale(5.0), 2.0);
    }

    #[test]
    fn test_validate_rejects_unusable_dimensions() {
        assert!(AnnotatorConfig::default().validate().is_ok());

        let cases = [
            AnnotatorConfig { zoom_step: -0.1, ..Default::default() },
            AnnotatorConfig { zoom_step: f32::NAN, ..Default::default() },
            AnnotatorConfig { default_region_width: 0.0, ..Default::default() },
            AnnotatorConfig { drag_threshold_px: -2.0, ..Default::default() },
            AnnotatorConfig { comment_marker_px: f32::INFINITY, ..Default::default() },
            AnnotatorConfig { max_scale: f32::INFINITY, ..Default::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidValue(_))),
                "{config:?} should be rejected"
            );
        }

        let zero_threshold = AnnotatorConfig::default().with_drag_threshold(0.0);
        assert!(zero_threshold.validate().is_ok());
    }

    #[test]
    fn test_from_file_rejects_negative_zoom_step() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotator.json");
        fs::write(&path, r#"{ "zoom_step": -0.5 }"#).unwrap();

        let result = AnnotatorConfig::from_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidValue(key)) if key == "zoom_step"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&ENV_KEYS);

        env::set_var("PDF_SIGNER_MIN_SCALE", "0.25");
        env::set_var("PDF_SIGNER_MAX_SCALE", "3");
        env::set_var("PDF_SIGNER_DEFAULT_COLOR", "#2196F3");

        let config = AnnotatorConfig::from_env().unwrap();
        assert_eq!(config.min_scale, 0.25);
        assert_eq!(config.max_scale, 3.0);
        assert_eq!(config.default_color, Color::BLUE);
    }

    #[test]
    #[serial]
    fn test_from_env_partial() {
        let _guard = EnvGuard::new(&ENV_KEYS);

        env::remove_var("PDF_SIGNER_MIN_SCALE");
        env::remove_var("PDF_SIGNER_DEFAULT_COLOR");
        env::set_var("PDF_SIGNER_MAX_SCALE", "1.5");

        let config = AnnotatorConfig::from_env().unwrap();
        assert_eq!(config.min_scale, 0.5); // default
        assert_eq!(config.max_scale, 1.5);
        assert_eq!(config.default_color, Color::YELLOW); // default
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&ENV_KEYS);

        env::remove_var("PDF_SIGNER_MAX_SCALE");
        env::remove_var("PDF_SIGNER_DEFAULT_COLOR");
        env::set_var("PDF_SIGNER_MIN_SCALE", "not_a_number");
        assert!(AnnotatorConfig::from_env().is_err());

        env::set_var("PDF_SIGNER_MIN_SCALE", "3.0");
        assert!(AnnotatorConfig::from_env().is_err(), "min above max must be rejected");

        env::remove_var("PDF_SIGNER_MIN_SCALE");
        env::set_var("PDF_SIGNER_DEFAULT_COLOR", "yellow");
        assert!(AnnotatorConfig::from_env().is_err());
    }

    // Helper to save and restore environment variables
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotator.json");

        let config = AnnotatorConfig::default().with_default_region(64.0, 16.0);
        config.save_to_file(&path).unwrap();

        let loaded = AnnotatorConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotator.json");
        fs::write(&path, r##"{ "max_scale": 3.0, "default_color": "#4CAF50" }"##).unwrap();

        let config = AnnotatorConfig::from_file(&path).unwrap();
        assert_eq!(config.max_scale, 3.0);
        assert_eq!(config.default_color, Color::GREEN);
        assert_eq!(config.min_scale, 0.5);
        assert_eq!(config.signature_pad, SignaturePadConfig::default());
    }

    #[test]
    fn test_from_file_missing() {
        let result = AnnotatorConfig::from_file("/nonexistent/annotator.json");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_from_file_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotator.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AnnotatorConfig::from_file(&path), Err(ConfigError::Parse(_))));
    }
}
