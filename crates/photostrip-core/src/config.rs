//! Booth configuration.
//!
//! Every knob of the pipeline lives here with a documented default. Hosts
//! may supply a partial JSON document; missing keys fall back to
//! [`Default`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported number of photos per strip.
pub const MAX_LAYOUT_COUNT: usize = 8;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for this schema
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.into(),
    }
}

/// Live-capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Aspect ratio every captured frame is center-cropped to
    pub target_ratio: f64,
    /// Width of the stored capture in pixels
    pub output_width: u32,
    /// Height of the stored capture in pixels
    pub output_height: u32,
    /// Minimum time between two successful captures
    pub cooldown_ms: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_ratio: 4.0 / 3.0,
            output_width: 640,
            output_height: 480,
            cooldown_ms: 500,
        }
    }
}

/// Crop editor settings. Sizes are in source pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub min_box_size: f64,
    /// Hit radius around each corner handle
    pub handle_tolerance: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_box_size: 50.0,
            handle_tolerance: 10.0,
            min_zoom: 1.0,
            max_zoom: 3.0,
        }
    }
}

/// Strip geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StripConfig {
    pub photo_width: u32,
    pub photo_height: u32,
    /// Margin around the photo stack on every side
    pub padding_px: u32,
    pub default_sticker_size: f64,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            photo_width: 400,
            photo_height: 300,
            padding_px: 20,
            default_sticker_size: 80.0,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Per-frame delay of the animated loop
    pub loop_frame_delay_ms: u32,
    pub page_width_mm: f64,
    pub page_height_mm: f64,
    pub page_margin_mm: f64,
    pub print_dpi: u32,
    /// Quality used when a JPEG still is requested without one
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        // A4 landscape
        Self {
            loop_frame_delay_ms: 800,
            page_width_mm: 297.0,
            page_height_mm: 210.0,
            page_margin_mm: 10.0,
            print_dpi: 150,
            jpeg_quality: 92,
        }
    }
}

impl ExportConfig {
    /// Printable area in millimetres (page minus margins on both sides).
    pub fn printable_mm(&self) -> (f64, f64) {
        (
            self.page_width_mm - 2.0 * self.page_margin_mm,
            self.page_height_mm - 2.0 * self.page_margin_mm,
        )
    }

    /// Convert millimetres to device pixels at `print_dpi`.
    pub fn mm_to_px(&self, mm: f64) -> u32 {
        (mm / 25.4 * self.print_dpi as f64).round().max(0.0) as u32
    }
}

/// Top-level configuration for one booth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoothConfig {
    /// Number of photos per strip (1..=8)
    pub layout_count: usize,
    pub capture: CaptureConfig,
    pub editor: EditorConfig,
    pub strip: StripConfig,
    pub export: ExportConfig,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            layout_count: 4,
            capture: CaptureConfig::default(),
            editor: EditorConfig::default(),
            strip: StripConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl BoothConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BoothConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout_count == 0 || self.layout_count > MAX_LAYOUT_COUNT {
            return Err(invalid(
                "layoutCount",
                format!("must be between 1 and {MAX_LAYOUT_COUNT}, got {}", self.layout_count),
            ));
        }

        let capture = &self.capture;
        if !positive(capture.target_ratio) {
            return Err(invalid("capture.targetRatio", "must be a positive number"));
        }
        if capture.output_width == 0 || capture.output_height == 0 {
            return Err(invalid("capture.outputWidth", "output size must be non-zero"));
        }

        let editor = &self.editor;
        if !positive(editor.min_box_size) {
            return Err(invalid("editor.minBoxSize", "must be positive"));
        }
        if editor.handle_tolerance < 0.0 {
            return Err(invalid("editor.handleTolerance", "must not be negative"));
        }
        if !positive(editor.min_zoom) || editor.min_zoom > editor.max_zoom {
            return Err(invalid(
                "editor.minZoom",
                format!(
                    "zoom range [{}, {}] is empty or non-positive",
                    editor.min_zoom, editor.max_zoom
                ),
            ));
        }

        let strip = &self.strip;
        if strip.photo_width == 0 || strip.photo_height == 0 {
            return Err(invalid("strip.photoWidth", "photo size must be non-zero"));
        }
        if !positive(strip.default_sticker_size) {
            return Err(invalid("strip.defaultStickerSize", "must be positive"));
        }

        let export = &self.export;
        if export.loop_frame_delay_ms == 0 {
            return Err(invalid("export.loopFrameDelayMs", "must be non-zero"));
        }
        if export.print_dpi == 0 {
            return Err(invalid("export.printDpi", "must be non-zero"));
        }
        if export.page_margin_mm < 0.0 {
            return Err(invalid("export.pageMarginMm", "must not be negative"));
        }
        let (printable_w, printable_h) = export.printable_mm();
        if !(positive(printable_w) && positive(printable_h)) {
            return Err(invalid("export.pageMarginMm", "margins consume the whole page"));
        }
        if export.jpeg_quality == 0 || export.jpeg_quality > 100 {
            return Err(invalid("export.jpegQuality", "must be between 1 and 100"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BoothConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout_count, 4);
        assert_eq!(config.capture.output_width, 640);
        assert_eq!(config.strip.padding_px, 20);
        assert_eq!(config.export.loop_frame_delay_ms, 800);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = BoothConfig::from_json(r#"{"layoutCount": 3, "strip": {"paddingPx": 12}}"#).unwrap();
        assert_eq!(config.layout_count, 3);
        assert_eq!(config.strip.padding_px, 12);
        assert_eq!(config.strip.photo_width, 400);
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(BoothConfig::from_json("{}").unwrap(), BoothConfig::default());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            BoothConfig::from_json("{layoutCount: 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_layout_count_range() {
        for bad in [0usize, 9] {
            let config = BoothConfig {
                layout_count: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { key: "layoutCount", .. })
            ));
        }
    }

    #[test]
    fn test_inverted_zoom_range_rejected() {
        let mut config = BoothConfig::default();
        config.editor.min_zoom = 4.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_margins_consuming_page_rejected() {
        let mut config = BoothConfig::default();
        config.export.page_margin_mm = 105.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mm_to_px() {
        let export = ExportConfig::default();
        assert_eq!(export.mm_to_px(25.4), 150);
        assert_eq!(export.printable_mm(), (277.0, 190.0));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&BoothConfig::default()).unwrap();
        assert!(json.contains("\"layoutCount\":4"));
        assert!(json.contains("\"loopFrameDelayMs\":800"));
    }
}
