//! Geometric primitives for document normalization.
//!
//! This module provides the point, polygon and quadrilateral types used by the
//! contour locator and the perspective rectifier, together with the polygon
//! algorithms they rely on: shoelace area, perimeter, and Douglas-Peucker
//! polygon approximation.

use imageproc::point::Point as ImageProcPoint;
use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Creates a point from an imageproc point with integer coordinates.
    pub fn from_imageproc_point(p: ImageProcPoint<u32>) -> Self {
        Self {
            x: p.x as f32,
            y: p.y as f32,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A closed polygon represented by its vertices in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    /// The vertices of the polygon.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Creates a new polygon from a vector of vertices.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Calculates the area of the polygon using the shoelace formula.
    ///
    /// Returns 0.0 if the polygon has fewer than 3 vertices.
    pub fn area(&self) -> f32 {
        if self.points.len() < 3 {
            return 0.0;
        }

        let mut area = 0.0;
        let n = self.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area.abs() / 2.0
    }

    /// Calculates the perimeter of the polygon (closed).
    pub fn perimeter(&self) -> f32 {
        let mut perimeter = 0.0;
        let n = self.points.len();
        for i in 0..n {
            let j = (i + 1) % n;
            perimeter += self.points[i].distance(&self.points[j]);
        }
        perimeter
    }

    /// Approximates the closed polygon using the Douglas-Peucker algorithm.
    ///
    /// # Arguments
    ///
    /// * `epsilon` - The maximum distance between the original curve and the
    ///   simplified curve.
    ///
    /// # Returns
    ///
    /// A new `Polygon` with simplified vertices. Polygons with 2 or fewer
    /// vertices are returned unchanged.
    ///
    /// The vertex list is treated as a closed ring. Douglas-Peucker pins both
    /// chain endpoints, which for a traced contour are two adjacent boundary
    /// pixels; a pruning pass afterwards drops ring vertices that lie within
    /// `epsilon` of the chord between their neighbors, so the duplicated
    /// start point (and any start point sitting on an otherwise straight
    /// edge) does not survive as a spurious vertex.
    pub fn approx_poly_dp(&self, epsilon: f32) -> Polygon {
        if self.points.len() <= 2 {
            return self.clone();
        }

        let mut simplified = Vec::new();
        douglas_peucker(&self.points, epsilon, &mut simplified);
        prune_ring_vertices(&mut simplified, epsilon);

        Polygon::new(simplified)
    }

    /// Interprets the polygon as a quadrilateral if it has exactly 4 vertices.
    pub fn as_quad(&self) -> Option<Quad> {
        if self.points.len() == 4 {
            Some(Quad::new([
                self.points[0],
                self.points[1],
                self.points[2],
                self.points[3],
            ]))
        } else {
            None
        }
    }
}

/// Iterative Douglas-Peucker simplification.
fn douglas_peucker(points: &[Point], epsilon: f32, result: &mut Vec<Point>) {
    if points.len() <= 2 {
        result.extend_from_slice(points);
        return;
    }

    let mut stack = Vec::new();
    stack.push((0, points.len() - 1));

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }

        // Find the vertex with maximum distance from the chord.
        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let dist = point_to_line_distance(&points[i], &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }

        if max_dist > epsilon {
            keep[max_index] = true;
            if max_index - start > 1 {
                stack.push((start, max_index));
            }
            if end - max_index > 1 {
                stack.push((max_index, end));
            }
        }
    }

    for (i, &should_keep) in keep.iter().enumerate() {
        if should_keep {
            result.push(points[i]);
        }
    }
}

/// Removes ring vertices that deviate by at most `epsilon` from the chord
/// between their two ring neighbors, never going below 3 vertices.
fn prune_ring_vertices(points: &mut Vec<Point>, epsilon: f32) {
    let mut changed = true;
    while changed && points.len() > 3 {
        changed = false;
        for i in 0..points.len() {
            let n = points.len();
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            if point_to_line_distance(&points[i], &prev, &next) <= epsilon {
                points.remove(i);
                changed = true;
                break;
            }
        }
    }
}

/// Perpendicular distance from a point to the line through `line_start` and
/// `line_end`.
fn point_to_line_distance(point: &Point, line_start: &Point, line_end: &Point) -> f32 {
    let a = line_end.y - line_start.y;
    let b = line_start.x - line_end.x;
    let c = line_end.x * line_start.y - line_start.x * line_end.y;

    let denominator = (a * a + b * b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    (a * point.x + b * point.y + c).abs() / denominator
}

/// Four unordered corner points of a detected document region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quad {
    /// The corner points, in no particular order.
    pub points: [Point; 4],
}

impl Quad {
    /// Creates a quadrilateral from four points.
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Shoelace area of the quadrilateral.
    pub fn area(&self) -> f32 {
        Polygon::new(self.points.to_vec()).area()
    }
}

/// The four corners of a quadrilateral in a fixed order.
///
/// Invariant: `tl` has the minimum `x + y` of the four corners, `br` the
/// maximum `x + y`, `tr` the minimum `y - x`, and `bl` the maximum `y - x`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedRect {
    /// Top-left corner.
    pub tl: Point,
    /// Top-right corner.
    pub tr: Point,
    /// Bottom-right corner.
    pub br: Point,
    /// Bottom-left corner.
    pub bl: Point,
}

impl OrderedRect {
    /// Orders the corners of a quadrilateral.
    ///
    /// The top-left corner minimizes `x + y` and the bottom-right maximizes
    /// it; the top-right corner minimizes `y - x` and the bottom-left
    /// maximizes it. Ties resolve to the first point in input order.
    pub fn from_quad(quad: &Quad) -> Self {
        let pts = &quad.points;

        let sum = |p: &Point| p.x + p.y;
        let diff = |p: &Point| p.y - p.x;

        let mut tl = pts[0];
        let mut br = pts[0];
        let mut tr = pts[0];
        let mut bl = pts[0];

        for p in pts.iter().skip(1) {
            if sum(p) < sum(&tl) {
                tl = *p;
            }
            if sum(p) > sum(&br) {
                br = *p;
            }
            if diff(p) < diff(&tr) {
                tr = *p;
            }
            if diff(p) > diff(&bl) {
                bl = *p;
            }
        }

        Self { tl, tr, br, bl }
    }

    /// Length of the top edge (`tl` to `tr`).
    pub fn top_len(&self) -> f32 {
        self.tl.distance(&self.tr)
    }

    /// Length of the bottom edge (`bl` to `br`).
    pub fn bottom_len(&self) -> f32 {
        self.bl.distance(&self.br)
    }

    /// Length of the left edge (`tl` to `bl`).
    pub fn left_len(&self) -> f32 {
        self.tl.distance(&self.bl)
    }

    /// Length of the right edge (`tr` to `br`).
    pub fn right_len(&self) -> f32 {
        self.tr.distance(&self.br)
    }
}
