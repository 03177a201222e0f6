//! Skew estimation and canvas-preserving rotation.
//!
//! The estimator finds line segments in the edge map via a Hough accumulator,
//! folds near-vertical segments onto their near-horizontal equivalents, and
//! takes the median segment angle — the median shrugs off the occasional
//! stray line that would drag a mean. Rotation expands the output canvas so
//! no corner is clipped, filling the new border with white.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::edges::canny;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::debug;

/// Canny hysteresis thresholds.
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// Minimum accumulator votes for a candidate line.
const VOTE_THRESHOLD: u32 = 100;
/// Non-maximum suppression radius in the accumulator.
const SUPPRESSION_RADIUS: u32 = 10;
/// Minimum length in pixels for an edge run to count as a segment.
const MIN_SEGMENT_LEN: f32 = 100.0;
/// Maximum gap in pixels bridged within a single segment.
const MAX_SEGMENT_GAP: u32 = 10;
/// Angles below this magnitude are reported as "already aligned".
const MIN_CORRECTION_DEG: f32 = 0.5;
/// Larger apparent skew is assumed to be a detection artifact and clamped.
const MAX_CORRECTION_DEG: f32 = 15.0;

/// A detected line segment with pixel-precision endpoints.
#[derive(Debug, Clone, Copy)]
struct Segment {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Segment {
    fn len(&self) -> f32 {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        (dx * dx + dy * dy).sqrt()
    }

    /// Direction angle in degrees, normalized so dx >= 0 (range [-90, 90]).
    fn angle_degrees(&self) -> f32 {
        let (mut dx, mut dy) = (self.x1 - self.x0, self.y1 - self.y0);
        if dx < 0.0 {
            dx = -dx;
            dy = -dy;
        }
        dy.atan2(dx).to_degrees()
    }
}

/// Estimates the dominant rotation of a scanned page.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkewEstimator;

impl SkewEstimator {
    /// Creates a new estimator.
    pub fn new() -> Self {
        Self
    }

    /// Estimates the skew angle of `gray` in degrees, rounded to 2 decimals.
    ///
    /// Returns 0.0 when no reliable estimate exists (no segments found) or
    /// when the median deviation is below 0.5°. Estimates beyond ±15° are
    /// clamped to that bound.
    pub fn estimate(&self, gray: &GrayImage) -> f32 {
        let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: VOTE_THRESHOLD,
                suppression_radius: SUPPRESSION_RADIUS,
            },
        );

        let mut angles = Vec::new();
        for line in &lines {
            for segment in trace_segments(&edges, line) {
                if let Some(angle) = fold_to_horizontal(segment.angle_degrees()) {
                    angles.push(angle);
                }
            }
        }

        if angles.is_empty() {
            debug!("no usable segments, skew treated as zero");
            return 0.0;
        }

        let median = median(&mut angles);
        if median.abs() < MIN_CORRECTION_DEG {
            return 0.0;
        }

        let clamped = median.clamp(-MAX_CORRECTION_DEG, MAX_CORRECTION_DEG);
        let rounded = (clamped * 100.0).round() / 100.0;
        debug!(median, rounded, segments = angles.len(), "skew estimated");
        rounded
    }
}

/// Keeps near-horizontal angles, folds near-vertical ones by ±90°, and
/// discards the rest.
fn fold_to_horizontal(angle: f32) -> Option<f32> {
    let a = angle.abs();
    if a < 45.0 {
        Some(angle)
    } else if a > 45.0 && a < 135.0 {
        Some(if angle > 0.0 { angle - 90.0 } else { angle + 90.0 })
    } else {
        None
    }
}

/// Walks along a Hough line through the edge map, collecting runs of edge
/// pixels. Gaps up to [`MAX_SEGMENT_GAP`] are bridged; runs shorter than
/// [`MIN_SEGMENT_LEN`] are discarded.
fn trace_segments(edges: &GrayImage, line: &PolarLine) -> Vec<Segment> {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin_t, cos_t) = theta.sin_cos();

    // Base point on the line closest to the origin; walk direction is the
    // line direction (perpendicular to the normal).
    let (bx, by) = (line.r * cos_t, line.r * sin_t);
    let (dx, dy) = (-sin_t, cos_t);

    let diag = ((width * width + height * height) as f32).sqrt().ceil() as i32;

    let mut segments = Vec::new();
    let mut run: Option<Segment> = None;
    let mut gap = 0u32;

    for t in -diag..=diag {
        let px = bx + t as f32 * dx;
        let py = by + t as f32 * dy;

        // Tolerate one pixel of jitter perpendicular to the line.
        let mut hit = None;
        for offset in [0.0f32, -1.0, 1.0] {
            let x = (px + offset * cos_t).round();
            let y = (py + offset * sin_t).round();
            if x >= 0.0
                && y >= 0.0
                && (x as u32) < width
                && (y as u32) < height
                && edges.get_pixel(x as u32, y as u32).0[0] > 0
            {
                hit = Some((x, y));
                break;
            }
        }

        match (hit, run.as_mut()) {
            (Some((x, y)), Some(segment)) => {
                segment.x1 = x;
                segment.y1 = y;
                gap = 0;
            }
            (Some((x, y)), None) => {
                run = Some(Segment {
                    x0: x,
                    y0: y,
                    x1: x,
                    y1: y,
                });
                gap = 0;
            }
            (None, Some(_)) => {
                gap += 1;
                if gap > MAX_SEGMENT_GAP {
                    if let Some(segment) = run.take() {
                        if segment.len() >= MIN_SEGMENT_LEN {
                            segments.push(segment);
                        }
                    }
                    gap = 0;
                }
            }
            (None, None) => {}
        }
    }

    if let Some(segment) = run {
        if segment.len() >= MIN_SEGMENT_LEN {
            segments.push(segment);
        }
    }

    segments
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Rotates images about their center onto an expanded canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rotator;

impl Rotator {
    /// Creates a new rotator.
    pub fn new() -> Self {
        Self
    }

    /// Rotates `image` by `angle_degrees` (the skew estimate) about its
    /// center, expanding the canvas so corners are not clipped and filling
    /// the uncovered border with white.
    pub fn rotate(&self, image: &RgbImage, angle_degrees: f32) -> RgbImage {
        let (width, height) = image.dimensions();
        let theta = angle_degrees.to_radians();
        let (sin_t, cos_t) = (theta.sin().abs(), theta.cos().abs());

        let new_width = (height as f32 * sin_t + width as f32 * cos_t) as u32;
        let new_height = (height as f32 * cos_t + width as f32 * sin_t) as u32;

        // De-rotate: content rotates by the negated estimate.
        let projection = Projection::translate(new_width as f32 / 2.0, new_height as f32 / 2.0)
            * Projection::rotate(-theta)
            * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

        let mut rotated = RgbImage::new(new_width, new_height);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgb([255, 255, 255]),
            &mut rotated,
        );
        rotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::buffer::ConvertBuffer;
    use image::Luma;
    use imageproc::drawing::draw_line_segment_mut;

    /// White page with several long dark lines at the given angle.
    fn page_with_lines(angle_degrees: f32) -> GrayImage {
        let mut gray = GrayImage::from_pixel(500, 400, Luma([255]));
        let slope = angle_degrees.to_radians().tan();
        for y0 in [80.0f32, 160.0, 240.0, 320.0] {
            draw_line_segment_mut(
                &mut gray,
                (40.0, y0),
                (460.0, y0 + 420.0 * slope),
                Luma([0]),
            );
        }
        gray
    }

    #[test]
    fn test_horizontal_lines_report_zero() {
        let gray = page_with_lines(0.0);
        assert_eq!(SkewEstimator::new().estimate(&gray), 0.0);
    }

    #[test]
    fn test_known_angle_recovered() {
        let gray = page_with_lines(3.0);
        let estimate = SkewEstimator::new().estimate(&gray);
        assert!(
            (estimate - 3.0).abs() <= 0.5,
            "estimate {estimate} not within 0.5 of 3.0"
        );
    }

    #[test]
    fn test_negative_angle_recovered() {
        let gray = page_with_lines(-4.0);
        let estimate = SkewEstimator::new().estimate(&gray);
        assert!(
            (estimate + 4.0).abs() <= 0.5,
            "estimate {estimate} not within 0.5 of -4.0"
        );
    }

    #[test]
    fn test_large_angle_clamped() {
        let gray = page_with_lines(25.0);
        let estimate = SkewEstimator::new().estimate(&gray);
        // Whatever the detector sees, the report stays inside the clamp.
        assert!(estimate.abs() <= 15.0);
    }

    #[test]
    fn test_blank_page_reports_zero() {
        let gray = GrayImage::from_pixel(300, 300, Luma([255]));
        assert_eq!(SkewEstimator::new().estimate(&gray), 0.0);
    }

    #[test]
    fn test_fold_to_horizontal() {
        assert_eq!(fold_to_horizontal(3.0), Some(3.0));
        assert_eq!(fold_to_horizontal(-44.0), Some(-44.0));
        assert_eq!(fold_to_horizontal(88.0), Some(-2.0));
        assert_eq!(fold_to_horizontal(-92.0), Some(-2.0));
        assert_eq!(fold_to_horizontal(170.0), None);
        assert_eq!(fold_to_horizontal(45.0), None);
    }

    #[test]
    fn test_rotation_expands_canvas_with_white_border() {
        let image = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
        let rotated = Rotator::new().rotate(&image, 10.0);

        let (w, h) = rotated.dimensions();
        assert!(w > 200);
        assert!(h > 100);
        // The new corners are border fill.
        assert_eq!(*rotated.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*rotated.get_pixel(w - 1, h - 1), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_estimate_then_rotate_deskews() {
        let gray = page_with_lines(3.0);
        let rgb: RgbImage = gray.convert();

        let angle = SkewEstimator::new().estimate(&gray);
        let rotated = Rotator::new().rotate(&rgb, angle);

        let releveled: GrayImage = rotated.convert();
        let residual = SkewEstimator::new().estimate(&releveled);
        assert!(
            residual.abs() <= 1.0,
            "residual skew {residual} after correction"
        );
    }
}
