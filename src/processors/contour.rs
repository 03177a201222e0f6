//! Document contour location.
//!
//! Finds the best 4-point polygon bounding a photographed document so the
//! perspective rectifier can warp it to a fronto-parallel rectangle. Not
//! finding a contour is a normal outcome (the page may already fill the
//! frame), reported as `None` rather than an error.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use itertools::Itertools;
use tracing::debug;

use super::geometry::{Point, Polygon, Quad};

/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// Sigma of the denoising blur before edge detection.
const BLUR_SIGMA: f32 = 1.1;
/// How many of the largest contours are considered.
const CANDIDATE_COUNT: usize = 5;
/// Polygon approximation tolerance as a fraction of the contour perimeter.
const APPROX_TOLERANCE: f32 = 0.02;
/// Minimum contour area as a fraction of the image area.
const MIN_AREA_FRACTION: f32 = 0.1;

/// Locates the document boundary in a grayscale image.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentContourLocator;

impl DocumentContourLocator {
    /// Creates a new locator.
    pub fn new() -> Self {
        Self
    }

    /// Finds the document quadrilateral, if any.
    ///
    /// The image is blurred and edge-detected, edges are dilated for
    /// continuity, and the external contours are examined from largest to
    /// smallest. The first of the five largest contours whose polygon
    /// approximation has exactly 4 vertices and covers more than 10% of the
    /// image area wins.
    pub fn locate(&self, gray: &GrayImage) -> Option<Quad> {
        let image_area = (gray.width() * gray.height()) as f32;
        if image_area == 0.0 {
            return None;
        }

        let blurred = gaussian_blur_f32(gray, BLUR_SIGMA);
        let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);
        let edges = dilate(&edges, Norm::LInf, 2);

        let polygons: Vec<Polygon> = find_contours::<u32>(&edges)
            .iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .map(contour_to_polygon)
            .sorted_by(|a, b| {
                b.area()
                    .partial_cmp(&a.area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .collect();

        for polygon in polygons.iter().take(CANDIDATE_COUNT) {
            let epsilon = APPROX_TOLERANCE * polygon.perimeter();
            let approx = polygon.approx_poly_dp(epsilon);

            if let Some(quad) = approx.as_quad() {
                let area = quad.area();
                if area > image_area * MIN_AREA_FRACTION {
                    debug!(
                        area,
                        image_area, "document contour located"
                    );
                    return Some(quad);
                }
            }
        }

        debug!("no document contour found");
        None
    }
}

fn contour_to_polygon(contour: &Contour<u32>) -> Polygon {
    Polygon::new(
        contour
            .points
            .iter()
            .map(|p| Point::from_imageproc_point(*p))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::OrderedRect;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn test_locates_dominant_rectangle() {
        // Dark background, bright page covering well over 10% of the frame.
        let mut gray = GrayImage::from_pixel(200, 200, Luma([40]));
        draw_filled_rect_mut(&mut gray, Rect::at(30, 20).of_size(140, 160), Luma([250]));

        let quad = DocumentContourLocator::new().locate(&gray).unwrap();
        let rect = OrderedRect::from_quad(&quad);

        // Corners land on the drawn rectangle, give or take the dilation.
        assert!((rect.tl.x - 30.0).abs() < 6.0);
        assert!((rect.tl.y - 20.0).abs() < 6.0);
        assert!((rect.br.x - 169.0).abs() < 6.0);
        assert!((rect.br.y - 179.0).abs() < 6.0);
    }

    #[test]
    fn test_blank_image_has_no_contour() {
        let gray = GrayImage::from_pixel(100, 100, Luma([255]));
        assert!(DocumentContourLocator::new().locate(&gray).is_none());
    }

    #[test]
    fn test_small_rectangle_rejected_by_area_threshold() {
        let mut gray = GrayImage::from_pixel(200, 200, Luma([40]));
        // 20x20 is 1% of the image, well under the 10% floor.
        draw_filled_rect_mut(&mut gray, Rect::at(90, 90).of_size(20, 20), Luma([250]));
        assert!(DocumentContourLocator::new().locate(&gray).is_none());
    }
}
