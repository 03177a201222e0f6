//! Geometry correction pipeline.
//!
//! Runs perspective rectification, skew rotation, and whitespace cropping in
//! that fixed order. Every stage is best-effort: when a stage cannot find
//! anything to correct, the image passes through unchanged and the report
//! records it.

use image::buffer::ConvertBuffer;
use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{ExamScanError, GeometryConfig, ScanResult};
use crate::processors::{
    DocumentContourLocator, PerspectiveRectifier, Rotator, SkewEstimator, WhitespaceCropper,
};

/// What a geometry run actually did.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryReport {
    /// The page quad was found and the image was rectified.
    pub perspective_applied: bool,
    /// Rotation applied to de-skew, in degrees. `0.0` when below the
    /// correction threshold or when no text lines were found.
    pub rotation_angle_degrees: f32,
    /// The content crop changed the image dimensions.
    pub cropped: bool,
}

impl GeometryReport {
    /// True when any stage changed the image.
    pub fn corrected_any(&self) -> bool {
        self.perspective_applied || self.rotation_angle_degrees != 0.0 || self.cropped
    }
}

/// A corrected page plus its report.
#[derive(Debug, Clone)]
pub struct GeometryResult {
    /// The corrected image.
    pub image: RgbImage,
    /// Which stages fired.
    pub report: GeometryReport,
}

/// Orchestrates the geometry processors over whole pages.
#[derive(Debug)]
pub struct GeometryPipeline {
    config: GeometryConfig,
    locator: DocumentContourLocator,
    rectifier: PerspectiveRectifier,
    estimator: SkewEstimator,
    rotator: Rotator,
    cropper: WhitespaceCropper,
}

impl GeometryPipeline {
    /// Builds a pipeline from a validated configuration.
    pub fn new(config: GeometryConfig) -> ScanResult<Self> {
        config.validate()?;
        let cropper = WhitespaceCropper::new(config.padding);
        Ok(Self {
            config,
            locator: DocumentContourLocator::new(),
            rectifier: PerspectiveRectifier::new(),
            estimator: SkewEstimator::new(),
            rotator: Rotator::new(),
            cropper,
        })
    }

    /// Builds a pipeline with all stages enabled and default padding.
    pub fn with_defaults() -> Self {
        // The default config always validates.
        Self::new(GeometryConfig::default()).unwrap_or_else(|_| unreachable!())
    }

    /// Corrects one page.
    ///
    /// Fails only on an unusable input image; stages that find nothing to
    /// correct are soft no-ops recorded in the report.
    pub fn correct(&self, image: RgbImage) -> ScanResult<GeometryResult> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ExamScanError::invalid_image(format!(
                "geometry input is {width}x{height}"
            )));
        }

        let mut current = image;
        let mut report = GeometryReport::default();

        if self.config.do_perspective {
            let gray: GrayImage = current.convert();
            if let Some(quad) = self.locator.locate(&gray) {
                if let Some(rectified) = self.rectifier.rectify(&current, &quad) {
                    current = rectified;
                    report.perspective_applied = true;
                } else {
                    debug!("page quad found but not invertible, perspective skipped");
                }
            }
        }

        if self.config.do_rotate {
            let gray: GrayImage = current.convert();
            let angle = self.estimator.estimate(&gray);
            if angle != 0.0 {
                current = self.rotator.rotate(&current, angle);
                report.rotation_angle_degrees = angle;
            }
        }

        if self.config.do_crop {
            if let Some(cropped) = self.cropper.crop(&current) {
                if cropped.dimensions() != current.dimensions() {
                    current = cropped;
                    report.cropped = true;
                }
            }
        }

        debug!(
            perspective = report.perspective_applied,
            rotation = report.rotation_angle_degrees,
            cropped = report.cropped,
            "geometry correction finished"
        );
        Ok(GeometryResult {
            image: current,
            report,
        })
    }

    /// Corrects a batch of pages in parallel. Fails on the first unusable
    /// image.
    pub fn correct_batch(&self, images: Vec<RgbImage>) -> ScanResult<Vec<GeometryResult>> {
        images
            .into_par_iter()
            .map(|image| self.correct(image))
            .collect()
    }
}

impl Default for GeometryPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn white_page(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
    }

    /// Text-like content: short dark blocks, none big enough to read as a
    /// page outline, none long enough to vote in the line detector.
    fn text_page() -> RgbImage {
        let mut image = white_page(400, 300);
        fill_rect(&mut image, 60, 60, 120, 70);
        fill_rect(&mut image, 60, 100, 130, 110);
        fill_rect(&mut image, 200, 150, 260, 160);
        fill_rect(&mut image, 60, 220, 110, 230);
        image
    }

    #[test]
    fn test_zero_sized_input_rejected() {
        let pipeline = GeometryPipeline::with_defaults();
        let result = pipeline.correct(RgbImage::new(0, 0));
        assert!(matches!(result, Err(ExamScanError::InvalidImage { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GeometryConfig {
            padding: 5000,
            ..GeometryConfig::default()
        };
        assert!(GeometryPipeline::new(config).is_err());
    }

    #[test]
    fn test_crop_reported() {
        let pipeline = GeometryPipeline::with_defaults();
        let result = pipeline.correct(text_page()).unwrap();

        assert!(result.report.cropped);
        assert!(result.image.width() < 400);
        assert!(result.image.height() < 300);
    }

    #[test]
    fn test_second_run_is_identity() {
        let pipeline = GeometryPipeline::with_defaults();
        let first = pipeline.correct(text_page()).unwrap();
        let second = pipeline.correct(first.image.clone()).unwrap();

        assert!(!second.report.perspective_applied);
        assert_eq!(second.report.rotation_angle_degrees, 0.0);
        assert!(!second.report.cropped);
        assert!(!second.report.corrected_any());
        assert_eq!(second.image.dimensions(), first.image.dimensions());
    }

    #[test]
    fn test_disabled_stages_do_nothing() {
        let config = GeometryConfig {
            do_perspective: false,
            do_rotate: false,
            do_crop: false,
            ..GeometryConfig::default()
        };
        let pipeline = GeometryPipeline::new(config).unwrap();
        let result = pipeline.correct(text_page()).unwrap();

        assert!(!result.report.corrected_any());
        assert_eq!(result.image.dimensions(), (400, 300));
    }

    #[test]
    fn test_batch_matches_single() {
        let pipeline = GeometryPipeline::with_defaults();
        let single = pipeline.correct(text_page()).unwrap();
        let batch = pipeline.correct_batch(vec![text_page(), text_page()]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].image.dimensions(), single.image.dimensions());
        assert_eq!(batch[1].report, single.report);
    }
}
