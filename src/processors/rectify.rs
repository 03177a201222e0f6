//! Perspective rectification.
//!
//! Warps the quadrilateral found by the contour locator to a fronto-parallel
//! rectangle. The target dimensions are taken from the longer of each pair of
//! opposite edges so no document content is squeezed.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::debug;

use super::geometry::{OrderedRect, Quad};

/// Rectifies a perspective-distorted document region.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    /// Creates a new rectifier.
    pub fn new() -> Self {
        Self
    }

    /// Warps `image` so the given quadrilateral becomes an axis-aligned
    /// rectangle, returning a new owned buffer of the target size.
    ///
    /// Target width is `max(top edge, bottom edge)` and target height is
    /// `max(left edge, right edge)`, truncated to whole pixels. Degenerate
    /// quads are rejected upstream by the contour locator's area threshold;
    /// should the control points still not yield an invertible homography,
    /// `None` is returned and the caller treats it as "no rectification".
    pub fn rectify(&self, image: &RgbImage, quad: &Quad) -> Option<RgbImage> {
        let rect = OrderedRect::from_quad(quad);

        let width = rect.top_len().max(rect.bottom_len()) as u32;
        let height = rect.left_len().max(rect.right_len()) as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let from = [
            (rect.tl.x, rect.tl.y),
            (rect.tr.x, rect.tr.y),
            (rect.br.x, rect.br.y),
            (rect.bl.x, rect.bl.y),
        ];
        let to = [
            (0.0, 0.0),
            ((width - 1) as f32, 0.0),
            ((width - 1) as f32, (height - 1) as f32),
            (0.0, (height - 1) as f32),
        ];

        let projection = Projection::from_control_points(from, to)?;

        let mut warped = RgbImage::new(width, height);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgb([255, 255, 255]),
            &mut warped,
        );

        debug!(width, height, "perspective rectified");
        Some(warped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Point;

    #[test]
    fn test_output_dimensions_from_edge_lengths() {
        let image = RgbImage::from_pixel(300, 300, Rgb([200, 200, 200]));
        // Trapezoid: top edge 100, bottom edge 200, sides 150 tall.
        let quad = Quad::new([
            Point::new(100.0, 50.0),
            Point::new(200.0, 50.0),
            Point::new(250.0, 200.0),
            Point::new(50.0, 200.0),
        ]);

        let warped = PerspectiveRectifier::new().rectify(&image, &quad).unwrap();
        let rect = OrderedRect::from_quad(&quad);
        let expected_w = rect.top_len().max(rect.bottom_len()) as u32;
        let expected_h = rect.left_len().max(rect.right_len()) as u32;
        assert_eq!(warped.dimensions(), (expected_w, expected_h));
    }

    #[test]
    fn test_axis_aligned_rectangle_is_identity() {
        // A gradient image so we can check content is preserved.
        let mut image = RgbImage::new(120, 80);
        for (x, y, p) in image.enumerate_pixels_mut() {
            *p = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
        }

        let quad = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(119.0, 0.0),
            Point::new(119.0, 79.0),
            Point::new(0.0, 79.0),
        ]);

        let warped = PerspectiveRectifier::new().rectify(&image, &quad).unwrap();
        assert_eq!(warped.dimensions(), (119, 79));

        // Identity within rounding: interior pixels should match the source.
        for (x, y) in [(10u32, 10u32), (60, 40), (100, 70)] {
            let a = warped.get_pixel(x, y);
            let b = image.get_pixel(x, y);
            assert!((a.0[0] as i32 - b.0[0] as i32).abs() <= 1);
            assert!((a.0[1] as i32 - b.0[1] as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_degenerate_quad_returns_none() {
        let image = RgbImage::new(100, 100);
        // All four corners collinear.
        let quad = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(30.0, 30.0),
        ]);
        assert!(PerspectiveRectifier::new().rectify(&image, &quad).is_none());
    }
}
