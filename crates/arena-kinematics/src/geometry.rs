//! Planar geometry primitives shared by the sensor, beacon and trilateration code.
//!
//! All angles are map-relative bearings in degrees, measured from the positive
//! x-axis towards the positive y-axis and normalized to `[0, 360)`.
//! Degenerate inputs (parallel or zero-length segments, impossible triangles)
//! yield `None` instead of an error.

use core::f64::consts::PI;
use core::fmt;
use libm::{acos, atan2, cos, fabs, sin, sqrt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Pose;

/// A point in arena coordinates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Arena x coordinate.
    pub x: f64,
    /// Arena y coordinate.
    pub y: f64,
}

impl Point {
    /// Construct a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f64 {
        distance(*self, other)
    }

    /// Bearing from this point towards `other`, in degrees `[0, 360)`.
    pub fn bearing_to(&self, other: Point) -> f64 {
        bearing(*self, other)
    }

    /// The point reached by travelling `distance` from this point along `angle` degrees.
    pub fn project(&self, angle: f64, distance: f64) -> Point {
        project(*self, angle, distance)
    }
}

impl From<Pose> for Point {
    fn from(pose: Pose) -> Self {
        Point::new(pose.x, pose.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// A line segment between two points; walls and sensor rays are both segments.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Segment {
    /// First endpoint.
    pub start: Point,
    /// Second endpoint.
    pub end: Point,
}

impl Segment {
    /// Construct a segment from its endpoints.
    pub const fn new(start: Point, end: Point) -> Self {
        Segment { start, end }
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        distance(self.start, self.end)
    }

    /// Intersection point of this segment with `other`.
    ///
    /// A cheap bounding-box reject runs first, then the intersection of the two
    /// supporting lines is solved with Cramer's rule on the direction vectors.
    /// The solution is accepted if it lies on both segments, allowing `tolerance`
    /// of slack on each axis so that rays grazing a wall endpoint still register.
    ///
    /// # Returns
    ///
    /// `None` when the segments do not meet, are parallel, or either is degenerate.
    pub fn intersection(&self, other: &Segment, tolerance: f64) -> Option<Point> {
        let (a1, a2, b1, b2) = (self.start, self.end, other.start, other.end);

        if a1.x.min(a2.x) > b1.x.max(b2.x) || a1.x.max(a2.x) < b1.x.min(b2.x) {
            return None;
        }
        if a1.y.min(a2.y) > b1.y.max(b2.y) || a1.y.max(a2.y) < b1.y.min(b2.y) {
            return None;
        }

        let x_diff = (a1.x - a2.x, b1.x - b2.x);
        let y_diff = (a1.y - a2.y, b1.y - b2.y);
        let det = |a: (f64, f64), b: (f64, f64)| a.0 * b.1 - a.1 * b.0;

        let div = det(x_diff, y_diff);
        if div == 0.0 {
            return None;
        }
        let d = (det((a1.x, a1.y), (a2.x, a2.y)), det((b1.x, b1.y), (b2.x, b2.y)));
        let p = Point::new(det(d, x_diff) / div, det(d, y_diff) / div);

        if within_bounds(p, self, tolerance) && within_bounds(p, other, tolerance) {
            Some(p)
        } else {
            None
        }
    }
}

fn within_bounds(p: Point, s: &Segment, tolerance: f64) -> bool {
    p.x >= s.start.x.min(s.end.x) - tolerance
        && p.x <= s.start.x.max(s.end.x) + tolerance
        && p.y >= s.start.y.min(s.end.y) - tolerance
        && p.y <= s.start.y.max(s.end.y) + tolerance
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    sqrt(dx * dx + dy * dy)
}

/// Bearing of the line from `from` to `to` in degrees `[0, 360)`.
///
/// Coincident points have bearing 0.
pub fn bearing(from: Point, to: Point) -> f64 {
    let angle = atan2(to.y - from.y, to.x - from.x) * 180.0 / PI;
    Pose::normalize_angle(angle)
}

/// Endpoint of a line that starts at `start` and runs `distance` along `angle` degrees.
///
/// A negative distance walks backwards along the bearing.
pub fn project(start: Point, angle: f64, distance: f64) -> Point {
    let rad = angle * PI / 180.0;
    Point::new(start.x + distance * cos(rad), start.y + distance * sin(rad))
}

/// Length of the side opposite `angle` (degrees) in a triangle with sides `a` and `b`
/// enclosing that angle (law of cosines).
pub fn triangle_side(a: f64, b: f64, angle: f64) -> f64 {
    let rad = angle * PI / 180.0;
    sqrt(fabs(a * a + b * b - 2.0 * a * b * cos(rad)))
}

/// Angle in degrees opposite side `c` of the triangle with sides `a`, `b`, `c`.
///
/// Returns `None` when `a` or `b` is zero. Rounding noise that pushes the
/// cosine slightly outside `[-1, 1]` is clamped.
pub fn triangle_angle(a: f64, b: f64, c: f64) -> Option<f64> {
    if a == 0.0 || b == 0.0 {
        return None;
    }
    let cosine = ((a * a + b * b - c * c) / (2.0 * a * b)).clamp(-1.0, 1.0);
    Some(acos(cosine) * 180.0 / PI)
}

/// Arithmetic mean of a set of points, `None` if the set is empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-6;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> Segment {
        Segment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn test_intersection_parallel_segments() {
        assert_eq!(seg(10.0, 10.0, 20.0, 10.0).intersection(&seg(10.0, 20.0, 20.0, 20.0), 0.001), None);
    }

    #[test]
    fn test_intersection_outside_segment() {
        assert_eq!(seg(10.0, 10.0, 20.0, 20.0).intersection(&seg(50.0, 5.0, 20.0, 18.0), 0.001), None);
    }

    #[test]
    fn test_intersection_crossing() {
        let p = seg(10.0, 10.0, 20.0, 20.0)
            .intersection(&seg(10.0, 8.0, 20.0, 22.0), 0.001)
            .unwrap();
        assert!((p.x - 15.0).abs() < EPSILON);
        assert!((p.y - 15.0).abs() < EPSILON);

        let p = seg(10.0, 10.0, 20.0, 30.0)
            .intersection(&seg(10.0, 0.0, 20.0, 40.0), 0.001)
            .unwrap();
        assert!((p.x - 15.0).abs() < EPSILON);
        assert!((p.y - 20.0).abs() < EPSILON);
    }

    #[test]
    fn test_intersection_zero_length_segment() {
        assert_eq!(seg(5.0, 5.0, 5.0, 5.0).intersection(&seg(0.0, 5.0, 10.0, 5.0), 0.001), None);
    }

    #[test]
    fn test_intersection_touching_endpoint_within_tolerance() {
        // Vertical ray ending exactly on a horizontal wall.
        let p = seg(0.0, 0.0, 0.0, 10.0)
            .intersection(&seg(-5.0, 10.0, 5.0, 10.0), 0.001)
            .unwrap();
        assert!((p.y - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_project() {
        let cases = [
            ((0.0, 0.0), 0.0, (100.0, 0.0)),
            ((0.0, 0.0), 45.0, (70.71, 70.71)),
            ((0.0, 0.0), 90.0, (0.0, 100.0)),
            ((0.0, 0.0), 135.0, (-70.71, 70.71)),
            ((0.0, 0.0), 180.0, (-100.0, 0.0)),
            ((0.0, 100.0), 270.0, (0.0, 0.0)),
            ((100.0, 100.0), 350.0, (198.48, 82.64)),
        ];
        for ((sx, sy), angle, (ex, ey)) in cases {
            let p = project(Point::new(sx, sy), angle, 100.0);
            assert!((p.x - ex).abs() < 0.01, "angle {angle}: x {}", p.x);
            assert!((p.y - ey).abs() < 0.01, "angle {angle}: y {}", p.y);
        }
    }

    #[test]
    fn test_project_negative_distance_walks_backwards() {
        let p = project(Point::new(10.0, 10.0), 0.0, -4.0);
        assert!((p.x - 6.0).abs() < EPSILON);
        assert!((p.y - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_triangle_angle() {
        assert!((triangle_angle(200.0, 200.0, 200.0).unwrap() - 60.0).abs() < EPSILON);
        let hyp = (200.0f64 * 200.0 * 2.0).sqrt();
        assert!((triangle_angle(200.0, 200.0, hyp).unwrap() - 90.0).abs() < EPSILON);
        assert_eq!(triangle_angle(371.0, 353.0, 160.0).unwrap().round(), 25.0);
        assert_eq!(triangle_angle(371.0, 160.0, 353.0).unwrap().round(), 71.0);
        assert_eq!(triangle_angle(0.0, 1.0, 1.0), None);
    }

    #[test]
    fn test_triangle_side() {
        assert!((triangle_side(200.0, 200.0, 60.0) - 200.0).abs() < EPSILON);
        assert_eq!(triangle_side(371.0, 371.0, 140.0).round(), 697.0);
        assert!(triangle_side(10.0, 10.0, 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_distance() {
        assert!((distance(Point::new(0.0, 10.0), Point::new(0.0, 0.0)) - 10.0).abs() < EPSILON);
        assert!((distance(Point::new(0.0, 10.0), Point::new(-20.0, 10.0)) - 20.0).abs() < EPSILON);
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(10.0, 10.0)).round(), 14.0);
    }

    #[test]
    fn test_bearing() {
        let origin = Point::new(0.0, 0.0);
        assert!((bearing(origin, Point::new(10.0, 0.0)) - 0.0).abs() < EPSILON);
        assert!((bearing(Point::new(10.0, 0.0), origin) - 180.0).abs() < EPSILON);
        assert!((bearing(origin, Point::new(0.0, 10.0)) - 90.0).abs() < EPSILON);
        assert!((bearing(Point::new(0.0, 10.0), origin) - 270.0).abs() < EPSILON);
        assert!((bearing(origin, Point::new(10.0, 10.0)) - 45.0).abs() < EPSILON);
        assert!((bearing(Point::new(10.0, 10.0), origin) - 225.0).abs() < EPSILON);
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(&[]), None);
        let c = centroid(&[Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(2.0, 6.0)]).unwrap();
        assert!((c.x - 2.0).abs() < EPSILON);
        assert!((c.y - 2.0).abs() < EPSILON);
    }
}
