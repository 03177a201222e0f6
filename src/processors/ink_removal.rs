//! Ink removal: filling masked pixels with plausible background.
//!
//! Two strategies exist, tried as an ordered capability chain:
//!
//! 1. [`RemovalStrategy::Inpaint`] — diffusion-based reconstruction of the
//!    masked region from its surroundings, followed by a light blur for edge
//!    blending. Preferred when the enhanced path is enabled.
//! 2. [`RemovalStrategy::FlatFill`] — masked pixels become background white
//!    and only the dilated mask boundary is blurred for smoother edges.
//!
//! A failing strategy is absorbed, never surfaced: the remover walks down the
//! chain and the flat fill at its end always produces a result.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use tracing::{debug, warn};

use crate::core::errors::{ExamScanError, ScanResult};

/// Sigma of the blending blur applied after filling.
const BLEND_SIGMA: f32 = 0.8;
/// Number of diffusion sweeps used by the inpainting fill.
const DIFFUSION_SWEEPS: usize = 60;
/// Mask coverage above which diffusion has no usable boundary to pull from.
const MAX_INPAINT_COVERAGE: f32 = 0.9;

/// A single ink removal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStrategy {
    /// Diffusion inpainting from surrounding pixels.
    Inpaint,
    /// Flat white fill with boundary blending.
    FlatFill,
}

/// Fills masked pixels in an image using an ordered chain of strategies.
#[derive(Debug, Clone)]
pub struct InkRemover {
    strategies: Vec<RemovalStrategy>,
}

impl InkRemover {
    /// Creates a remover with an explicit strategy chain.
    pub fn new(strategies: Vec<RemovalStrategy>) -> Self {
        Self { strategies }
    }

    /// The chain used by the erase pipeline: inpainting first when the
    /// enhanced path is enabled, flat fill as the terminal fallback.
    pub fn chain(enhanced: bool) -> Self {
        if enhanced {
            Self::new(vec![RemovalStrategy::Inpaint, RemovalStrategy::FlatFill])
        } else {
            Self::new(vec![RemovalStrategy::FlatFill])
        }
    }

    /// Removes the masked ink from `image`.
    ///
    /// Always returns an image: strategy failures fall through to the next
    /// entry in the chain, and a mask that does not match the image
    /// dimensions leaves the image unchanged.
    pub fn remove(&self, image: &RgbImage, mask: &GrayImage) -> RgbImage {
        if image.dimensions() != mask.dimensions() {
            warn!(
                image_dims = ?image.dimensions(),
                mask_dims = ?mask.dimensions(),
                "ink mask does not match image dimensions, skipping removal"
            );
            return image.clone();
        }

        for strategy in &self.strategies {
            match self.apply(*strategy, image, mask) {
                Ok(result) => {
                    debug!(?strategy, "ink removal succeeded");
                    return result;
                }
                Err(err) => {
                    warn!(?strategy, error = %err, "ink removal strategy failed, falling back");
                }
            }
        }

        // An empty or fully exhausted chain still yields the baseline fill.
        flat_fill(image, mask)
    }

    fn apply(
        &self,
        strategy: RemovalStrategy,
        image: &RgbImage,
        mask: &GrayImage,
    ) -> ScanResult<RgbImage> {
        match strategy {
            RemovalStrategy::Inpaint => inpaint(image, mask),
            RemovalStrategy::FlatFill => Ok(flat_fill(image, mask)),
        }
    }
}

impl Default for InkRemover {
    fn default() -> Self {
        Self::chain(true)
    }
}

/// Diffusion inpainting: masked pixels are iteratively replaced by the mean
/// of their 4-neighborhood until the fill settles, then the whole image gets
/// a light blur so reconstructed regions blend with their surroundings.
fn inpaint(image: &RgbImage, mask: &GrayImage) -> ScanResult<RgbImage> {
    let (width, height) = image.dimensions();
    let masked: Vec<(u32, u32)> = mask
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 0)
        .map(|(x, y, _)| (x, y))
        .collect();

    if masked.is_empty() {
        return Ok(image.clone());
    }

    let coverage = masked.len() as f32 / (width as f32 * height as f32);
    if coverage > MAX_INPAINT_COVERAGE {
        return Err(ExamScanError::processing(
            "inpaint",
            format!("mask covers {:.0}% of the image", coverage * 100.0),
        ));
    }

    // Work in f32 so repeated averaging does not accumulate rounding bias.
    let mut buffer: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [p.0[0] as f32, p.0[1] as f32, p.0[2] as f32])
        .collect();

    // Seed the masked region with background white before diffusing.
    for &(x, y) in &masked {
        buffer[(y * width + x) as usize] = [255.0, 255.0, 255.0];
    }

    for _ in 0..DIFFUSION_SWEEPS {
        for &(x, y) in &masked {
            let mut sum = [0.0f32; 3];
            let mut count = 0.0f32;
            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx < width && ny < height {
                    let p = buffer[(ny * width + nx) as usize];
                    sum[0] += p[0];
                    sum[1] += p[1];
                    sum[2] += p[2];
                    count += 1.0;
                }
            }
            if count > 0.0 {
                buffer[(y * width + x) as usize] =
                    [sum[0] / count, sum[1] / count, sum[2] / count];
            }
        }
    }

    let mut result = image.clone();
    for &(x, y) in &masked {
        let p = buffer[(y * width + x) as usize];
        result.put_pixel(
            x,
            y,
            Rgb([
                p[0].round().clamp(0.0, 255.0) as u8,
                p[1].round().clamp(0.0, 255.0) as u8,
                p[2].round().clamp(0.0, 255.0) as u8,
            ]),
        );
    }

    Ok(gaussian_blur_f32(&result, BLEND_SIGMA))
}

/// Baseline removal: masked pixels become white, and the dilated mask region
/// is blurred so the fill edge does not show as a hard step.
fn flat_fill(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut result = image.clone();
    for (x, y, p) in mask.enumerate_pixels() {
        if p.0[0] > 0 {
            result.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }

    let blend_zone = dilate(mask, Norm::LInf, 1);
    let blurred = gaussian_blur_f32(&result, BLEND_SIGMA);
    for (x, y, p) in blend_zone.enumerate_pixels() {
        if p.0[0] > 0 {
            result.put_pixel(x, y, *blurred.get_pixel(x, y));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn page_with_stroke() -> (RgbImage, GrayImage) {
        let mut image = RgbImage::from_pixel(60, 40, Rgb([250, 250, 250]));
        let mut mask = GrayImage::new(60, 40);
        for x in 10..30 {
            for y in 18..22 {
                image.put_pixel(x, y, Rgb([20, 40, 200]));
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        (image, mask)
    }

    #[test]
    fn test_flat_fill_whitens_masked_pixels() {
        let (image, mask) = page_with_stroke();
        let remover = InkRemover::chain(false);
        let result = remover.remove(&image, &mask);

        // Interior of the stroke must be near-white after the fill.
        let p = result.get_pixel(20, 20);
        assert!(p.0[0] > 230 && p.0[1] > 230 && p.0[2] > 230);
        // Pixels far from the mask are untouched.
        assert_eq!(*result.get_pixel(50, 5), Rgb([250, 250, 250]));
    }

    #[test]
    fn test_inpaint_reconstructs_background() {
        let (image, mask) = page_with_stroke();
        let result = inpaint(&image, &mask).unwrap();

        // Surrounded by near-white background, diffusion should settle close
        // to the background level.
        let p = result.get_pixel(20, 20);
        assert!(p.0[0] > 220 && p.0[1] > 220 && p.0[2] > 220);
    }

    #[test]
    fn test_inpaint_rejects_excessive_coverage() {
        let image = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let mask = GrayImage::from_pixel(20, 20, Luma([255]));
        assert!(inpaint(&image, &mask).is_err());
    }

    #[test]
    fn test_chain_falls_back_and_still_returns() {
        // Fully masked image: inpaint fails, flat fill absorbs the failure.
        let image = RgbImage::from_pixel(20, 20, Rgb([10, 10, 10]));
        let mask = GrayImage::from_pixel(20, 20, Luma([255]));
        let result = InkRemover::default().remove(&image, &mask);
        assert!(result.get_pixel(10, 10).0[0] > 230);
    }

    #[test]
    fn test_mismatched_mask_is_a_no_op() {
        let (image, _) = page_with_stroke();
        let mask = GrayImage::new(10, 10);
        let result = InkRemover::default().remove(&image, &mask);
        assert_eq!(result, image);
    }

    #[test]
    fn test_empty_mask_changes_nothing_material() {
        let (image, _) = page_with_stroke();
        let mask = GrayImage::new(60, 40);
        let result = InkRemover::default().remove(&image, &mask);
        assert_eq!(result, image);
    }
}
