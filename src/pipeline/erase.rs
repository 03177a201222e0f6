//! Handwriting erasure pipeline.
//!
//! Glues the ink mask builder to the removal chain: detect the requested ink
//! classes, then paint the masked pixels out.

use image::RgbImage;
use rayon::prelude::*;
use tracing::debug;

use crate::core::{EraseConfig, ExamScanError, ScanResult};
use crate::processors::{InkMaskBuilder, InkRemover};

/// Removes handwritten marks from scanned pages.
#[derive(Debug)]
pub struct ErasePipeline {
    config: EraseConfig,
    builder: InkMaskBuilder,
    remover: InkRemover,
}

impl ErasePipeline {
    /// Builds a pipeline for the given configuration.
    pub fn new(config: EraseConfig) -> Self {
        Self {
            config,
            builder: InkMaskBuilder::new(),
            remover: InkRemover::chain(config.enhanced),
        }
    }

    /// Erases the configured ink classes from one page.
    pub fn erase(&self, image: &RgbImage) -> ScanResult<RgbImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ExamScanError::invalid_image(format!(
                "erase input is {width}x{height}"
            )));
        }

        let mask = self.builder.build(image, self.config.mode);
        let masked = mask.pixels().filter(|pixel| pixel.0[0] > 0).count();
        debug!(
            mode = ?self.config.mode,
            masked_pixels = masked,
            "ink mask built"
        );
        Ok(self.remover.remove(image, &mask))
    }

    /// Erases a batch of pages in parallel.
    pub fn erase_batch(&self, images: &[RgbImage]) -> ScanResult<Vec<RgbImage>> {
        images.par_iter().map(|image| self.erase(image)).collect()
    }
}

impl Default for ErasePipeline {
    fn default() -> Self {
        Self::new(EraseConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EraseMode;
    use image::Rgb;

    fn page_with_blue_stroke() -> RgbImage {
        let mut image = RgbImage::from_pixel(80, 60, Rgb([255, 255, 255]));
        for x in 20..50 {
            for y in 28..32 {
                image.put_pixel(x, y, Rgb([20, 30, 220]));
            }
        }
        image
    }

    #[test]
    fn test_zero_sized_input_rejected() {
        let pipeline = ErasePipeline::default();
        assert!(matches!(
            pipeline.erase(&RgbImage::new(0, 0)),
            Err(ExamScanError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_blue_stroke_erased() {
        let pipeline = ErasePipeline::default();
        let erased = pipeline.erase(&page_with_blue_stroke()).unwrap();

        for (_, _, pixel) in erased.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            // No saturated blue may survive.
            assert!(
                !(b > 150 && r < 100 && g < 100),
                "blue ink left at ({r},{g},{b})"
            );
        }
    }

    #[test]
    fn test_blue_mode_leaves_red_untouched() {
        let mut source = RgbImage::from_pixel(80, 60, Rgb([255, 255, 255]));
        for x in 20..50 {
            for y in 28..32 {
                source.put_pixel(x, y, Rgb([220, 30, 30]));
            }
        }

        let config = EraseConfig {
            mode: EraseMode::Blue,
            ..EraseConfig::default()
        };
        let pipeline = ErasePipeline::new(config);
        let erased = pipeline.erase(&source).unwrap();
        // Only blue detection is on, the red stroke stays.
        assert_eq!(erased.get_pixel(30, 30).0, [220, 30, 30]);
    }

    #[test]
    fn test_batch_matches_single() {
        let pipeline = ErasePipeline::default();
        let source = page_with_blue_stroke();
        let single = pipeline.erase(&source).unwrap();
        let batch = pipeline.erase_batch(&[source.clone(), source]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], single);
        assert_eq!(batch[1], single);
    }
}
