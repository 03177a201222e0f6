//! Ink mask construction.
//!
//! Builds a binary mask marking the pixels classified as handwritten or
//! colored marking on a scanned exam page. Colored ink (blue, red, green pen)
//! is detected by hue ranges in HSV space; dark handwriting is detected by a
//! local adaptive threshold followed by a dilate-then-erode pass that keeps
//! thicker, less regular strokes and discards typeset glyph detail.
//!
//! The mask is ephemeral: it is consumed immediately by
//! [`InkRemover`](crate::processors::ink_removal::InkRemover).

use image::{buffer::ConvertBuffer, GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::box_filter;
use imageproc::morphology::{dilate, erode};

use crate::core::EraseMode;

/// An inclusive hue interval in OpenCV scale (H in `[0, 180]`), with the
/// minimum saturation and value required for a pixel to count as ink.
#[derive(Debug, Clone, Copy)]
struct HueRange {
    h_lo: u8,
    h_hi: u8,
}

impl HueRange {
    const fn new(h_lo: u8, h_hi: u8) -> Self {
        Self { h_lo, h_hi }
    }

    fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        h >= self.h_lo && h <= self.h_hi && s >= MIN_SATURATION && v >= MIN_VALUE
    }
}

/// Blue pen hue interval.
const BLUE: HueRange = HueRange::new(90, 130);
/// Red straddles the hue wrap-around at 0/180 and needs two intervals.
const RED_LOW: HueRange = HueRange::new(0, 10);
const RED_HIGH: HueRange = HueRange::new(170, 180);
/// Green pen hue interval.
const GREEN: HueRange = HueRange::new(35, 85);

/// Saturation floor below which a pixel is treated as gray, not colored ink.
const MIN_SATURATION: u8 = 50;
/// Value floor below which a pixel is too dark to classify by hue.
const MIN_VALUE: u8 = 50;

/// Block size of the adaptive threshold used for dark-stroke detection.
const ADAPTIVE_BLOCK: u32 = 15;
/// Offset subtracted from the local mean; pixels darker than that are strokes.
const ADAPTIVE_OFFSET: u8 = 8;

/// Dilation radius of the dark-stroke closing pass.
const STROKE_DILATE_RADIUS: u8 = 1;
/// Erosion radius of the dark-stroke closing pass. Larger than the dilation:
/// the net erosion dissolves strokes thinner than about 3 pixels.
const STROKE_ERODE_RADIUS: u8 = 2;

/// Builds binary ink masks from color images.
///
/// Pure: the output depends only on the input image and the erase mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct InkMaskBuilder;

impl InkMaskBuilder {
    /// Creates a new mask builder.
    pub fn new() -> Self {
        Self
    }

    /// Derives the binary ink mask for `image` under the given mode.
    ///
    /// The returned mask has the same dimensions as the image; 255 marks ink.
    /// Each selected source mask is unioned, and the union is dilated so that
    /// anti-aliased stroke edges are fully covered.
    pub fn build(&self, image: &RgbImage, mode: EraseMode) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut mask = GrayImage::new(width, height);

        if mode.includes_blue() || mode.includes_red_green() {
            self.mask_colored_ink(image, mode, &mut mask);
        }

        if mode.includes_dark() {
            let dark = self.mask_dark_strokes(image);
            union_into(&mut mask, &dark);
        }

        // Radius 2 covers the two dilation passes the stroke edges need.
        dilate(&mask, Norm::LInf, 2)
    }

    /// Marks pixels whose hue falls in one of the enabled pen-color ranges.
    fn mask_colored_ink(&self, image: &RgbImage, mode: EraseMode, mask: &mut GrayImage) {
        for (x, y, pixel) in image.enumerate_pixels() {
            let (h, s, v) = rgb_to_hsv(pixel.0[0], pixel.0[1], pixel.0[2]);

            let blue = mode.includes_blue() && BLUE.contains(h, s, v);
            let red_green = mode.includes_red_green()
                && (RED_LOW.contains(h, s, v)
                    || RED_HIGH.contains(h, s, v)
                    || GREEN.contains(h, s, v));

            if blue || red_green {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    /// Detects dark handwriting strokes.
    ///
    /// A local adaptive threshold marks everything darker than its
    /// neighborhood, which includes typeset text. The dilate-then-erode pass
    /// afterwards uses a larger erosion radius than dilation, so thick
    /// handwritten strokes survive (thinned) while thin regular glyph strokes
    /// dissolve entirely.
    fn mask_dark_strokes(&self, image: &RgbImage) -> GrayImage {
        let gray: GrayImage = image.convert();
        let radius = ADAPTIVE_BLOCK / 2;
        let local_mean = box_filter(&gray, radius, radius);

        let mut binary = GrayImage::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let mean = local_mean.get_pixel(x, y).0[0];
            if pixel.0[0] < mean.saturating_sub(ADAPTIVE_OFFSET) {
                binary.put_pixel(x, y, Luma([255]));
            }
        }

        let dilated = dilate(&binary, Norm::LInf, STROKE_DILATE_RADIUS);
        erode(&dilated, Norm::LInf, STROKE_ERODE_RADIUS)
    }
}

/// ORs `src` into `dst`. Both masks must have identical dimensions.
fn union_into(dst: &mut GrayImage, src: &GrayImage) {
    debug_assert_eq!(dst.dimensions(), src.dimensions());
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        if s.0[0] > 0 {
            d.0[0] = 255;
        }
    }
}

/// Converts an RGB pixel to HSV in OpenCV scale: H in `[0, 180]`, S and V in
/// `[0, 255]`.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };

    (
        (h_deg / 2.0).round() as u8,
        (s * 255.0).round() as u8,
        (v * 255.0).round() as u8,
    )
}
