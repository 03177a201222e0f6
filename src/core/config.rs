//! Configuration values for the pipelines.
//!
//! Every option a caller can set is an explicit typed field with a default,
//! replacing the loosely typed request maps that service layers tend to pass
//! around. Each config has a `validate` method; pipelines validate once at
//! construction so the per-image paths never re-check.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::ExamScanError;

/// Which classes of marking the ink mask should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EraseMode {
    /// All sources: blue, red, green hues plus dark handwriting strokes.
    #[default]
    Auto,
    /// Blue ink only.
    Blue,
    /// Dark/black handwriting only (typeset glyphs are kept).
    Black,
    /// All colored ink (blue, red, green), dark strokes untouched.
    Color,
    /// Same coverage as `Auto`; requests the enhanced removal path.
    Ai,
}

impl EraseMode {
    /// Whether blue-hue detection contributes to the mask.
    pub fn includes_blue(self) -> bool {
        !matches!(self, EraseMode::Black)
    }

    /// Whether red/green-hue detection contributes to the mask.
    pub fn includes_red_green(self) -> bool {
        matches!(self, EraseMode::Auto | EraseMode::Ai | EraseMode::Color)
    }

    /// Whether dark-stroke detection contributes to the mask.
    pub fn includes_dark(self) -> bool {
        matches!(self, EraseMode::Auto | EraseMode::Ai | EraseMode::Black)
    }
}

impl FromStr for EraseMode {
    type Err = ExamScanError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "auto" => Ok(EraseMode::Auto),
            "blue" => Ok(EraseMode::Blue),
            "black" => Ok(EraseMode::Black),
            "color" => Ok(EraseMode::Color),
            "ai" => Ok(EraseMode::Ai),
            other => Err(ExamScanError::config(format!(
                "unknown erase mode '{other}', expected one of auto|blue|black|color|ai"
            ))),
        }
    }
}

/// Configuration for handwriting erasure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EraseConfig {
    /// Which ink sources to detect and remove.
    pub mode: EraseMode,
    /// Whether the diffusion-inpainting path may be used. When false, or when
    /// inpainting fails, the flat-fill path is used instead.
    pub enhanced: bool,
}

impl Default for EraseConfig {
    fn default() -> Self {
        Self {
            mode: EraseMode::Auto,
            enhanced: true,
        }
    }
}

/// Configuration for the geometry correction pipeline.
///
/// Stage order is fixed (perspective, then rotation, then crop); the flags
/// only switch individual stages off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Detect the document contour and rectify perspective distortion.
    pub do_perspective: bool,
    /// Estimate the dominant skew angle and de-rotate.
    pub do_rotate: bool,
    /// Trim uniform near-white borders.
    pub do_crop: bool,
    /// Padding in pixels kept around the content when cropping.
    pub padding: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            do_perspective: true,
            do_rotate: true,
            do_crop: true,
            padding: 10,
        }
    }
}

impl GeometryConfig {
    /// Checks that the configuration values are usable.
    pub fn validate(&self) -> Result<(), ExamScanError> {
        // A padding larger than any sane page border points at a unit mix-up
        // in the caller, reject early rather than producing useless crops.
        if self.padding > 1000 {
            return Err(ExamScanError::config(format!(
                "crop padding {} exceeds the supported maximum of 1000",
                self.padding
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeometryConfig::default();
        assert!(config.do_perspective);
        assert!(config.do_rotate);
        assert!(config.do_crop);
        assert_eq!(config.padding, 10);
        assert!(config.validate().is_ok());

        let erase = EraseConfig::default();
        assert_eq!(erase.mode, EraseMode::Auto);
        assert!(erase.enhanced);
    }

    #[test]
    fn test_erase_mode_sources() {
        assert!(EraseMode::Auto.includes_blue());
        assert!(EraseMode::Auto.includes_red_green());
        assert!(EraseMode::Auto.includes_dark());

        assert!(EraseMode::Black.includes_dark());
        assert!(!EraseMode::Black.includes_blue());
        assert!(!EraseMode::Black.includes_red_green());

        assert!(EraseMode::Color.includes_blue());
        assert!(EraseMode::Color.includes_red_green());
        assert!(!EraseMode::Color.includes_dark());

        assert!(EraseMode::Blue.includes_blue());
        assert!(!EraseMode::Blue.includes_red_green());
        assert!(!EraseMode::Blue.includes_dark());
    }

    #[test]
    fn test_erase_mode_from_str() {
        assert_eq!("ai".parse::<EraseMode>().unwrap(), EraseMode::Ai);
        assert!("scribble".parse::<EraseMode>().is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = GeometryConfig {
            padding: 5000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let json = r#"{"do_perspective": false, "padding": 4}"#;
        let config: GeometryConfig = serde_json::from_str(json).unwrap();
        assert!(!config.do_perspective);
        assert!(config.do_rotate);
        assert_eq!(config.padding, 4);
    }
}
