//! Whitespace border cropping.
//!
//! Trims the uniform near-white border around page content, keeping a
//! configurable padding. A fully blank image is returned unchanged; having
//! nothing to crop to is not an error.

use image::{buffer::ConvertBuffer, imageops, GrayImage, RgbImage};
use tracing::debug;

/// Grayscale level above which a pixel counts as background.
const BACKGROUND_THRESHOLD: u8 = 250;

/// Crops uniform near-white borders around the content of a page.
#[derive(Debug, Clone, Copy)]
pub struct WhitespaceCropper {
    padding: u32,
}

impl WhitespaceCropper {
    /// Creates a cropper keeping `padding` pixels around the content.
    pub fn new(padding: u32) -> Self {
        Self { padding }
    }

    /// Crops `image` to its content bounding box expanded by the padding and
    /// clipped to the image bounds.
    ///
    /// Returns `None` when the image contains no foreground at all, in which
    /// case the caller keeps the original image.
    pub fn crop(&self, image: &RgbImage) -> Option<RgbImage> {
        let gray: GrayImage = image.convert();

        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut found = false;

        for (x, y, pixel) in gray.enumerate_pixels() {
            if pixel.0[0] <= BACKGROUND_THRESHOLD {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                found = true;
            }
        }

        if !found {
            debug!("no foreground pixels, skipping whitespace crop");
            return None;
        }

        let (width, height) = image.dimensions();
        let x0 = min_x.saturating_sub(self.padding);
        let y0 = min_y.saturating_sub(self.padding);
        let x1 = (max_x + self.padding + 1).min(width);
        let y1 = (max_y + self.padding + 1).min(height);

        debug!(x0, y0, x1, y1, "whitespace crop bounds");
        Some(imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image())
    }
}

impl Default for WhitespaceCropper {
    fn default() -> Self {
        Self::new(10)
    }
}
