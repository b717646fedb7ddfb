//! Planar geometry and the immutable wall store that bounds the track.
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::MIN_CYCLE_VERTICES;
use crate::error::TrackError;

/// A point (or vector) in track space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Z component of the 3D cross product; zero when the vectors are parallel.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x.mul_add(other.y, -(self.y * other.x))
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) / 2.0
    }

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

/// One immutable edge of a track boundary. Always has non-zero length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallSegment {
    start: Point,
    end: Point,
}

impl WallSegment {
    /// Build a segment, rejecting zero-length or non-finite input.
    #[must_use]
    pub fn new(start: Point, end: Point) -> Option<Self> {
        if !start.is_finite() || !end.is_finite() || start == end {
            return None;
        }
        Some(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    #[must_use]
    pub fn direction(&self) -> Point {
        self.end - self.start
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Whether `point` lies inside the segment's bounding box on both axes.
    #[must_use]
    pub fn bounds_contain(&self, point: Point, epsilon: f64) -> bool {
        let (min_x, max_x) = ordered(self.start.x, self.end.x);
        let (min_y, max_y) = ordered(self.start.y, self.end.y);
        point.x >= min_x - epsilon
            && point.x <= max_x + epsilon
            && point.y >= min_y - epsilon
            && point.y <= max_y + epsilon
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Which closed cycle a wall belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    Inner,
    Outer,
}

impl Boundary {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Outer => "outer",
        }
    }
}

/// Ordered, immutable list of wall segments built from two closed cycles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallStore {
    segments: Vec<WallSegment>,
    inner_count: usize,
}

impl WallStore {
    /// Connect each vertex list into a closed cycle and store both cycles.
    ///
    /// Zero-length edges (repeated vertices) are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if either list has fewer than three vertices, holds a
    /// non-finite coordinate, or collapses to fewer than three real edges.
    pub fn from_cycles(inner: &[Point], outer: &[Point]) -> Result<Self, TrackError> {
        let mut segments = cycle_segments(Boundary::Inner, inner)?;
        let inner_count = segments.len();
        segments.extend(cycle_segments(Boundary::Outer, outer)?);
        Ok(Self {
            segments,
            inner_count,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[WallSegment] {
        &self.segments
    }

    #[must_use]
    pub fn boundary(&self, boundary: Boundary) -> &[WallSegment] {
        match boundary {
            Boundary::Inner => &self.segments[..self.inner_count],
            Boundary::Outer => &self.segments[self.inner_count..],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn cycle_segments(boundary: Boundary, vertices: &[Point]) -> Result<Vec<WallSegment>, TrackError> {
    if vertices.len() < MIN_CYCLE_VERTICES {
        return Err(TrackError::TooFewVertices {
            boundary: boundary.label(),
            min: MIN_CYCLE_VERTICES,
            got: vertices.len(),
        });
    }
    if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(TrackError::NonFiniteVertex {
            boundary: boundary.label(),
            index,
        });
    }

    let closing = vertices.iter().skip(1).chain(vertices.first());
    let mut segments = Vec::with_capacity(vertices.len());
    for (index, (&start, &end)) in vertices.iter().zip(closing).enumerate() {
        match WallSegment::new(start, end) {
            Some(segment) => segments.push(segment),
            None => log::debug!(
                "skipping degenerate {} wall edge {index} at ({:.2}, {:.2})",
                boundary.label(),
                start.x,
                start.y
            ),
        }
    }

    if segments.len() < MIN_CYCLE_VERTICES {
        return Err(TrackError::CollapsedCycle {
            boundary: boundary.label(),
            segments: segments.len(),
            min: MIN_CYCLE_VERTICES,
        });
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<Point> {
        vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ]
    }

    #[test]
    fn cycles_close_back_to_first_vertex() {
        let store = WallStore::from_cycles(&square(40.0, 60.0), &square(0.0, 100.0)).unwrap();
        assert_eq!(store.len(), 8);
        let inner = store.boundary(Boundary::Inner);
        assert_eq!(inner.len(), 4);
        assert_eq!(inner[3].start(), Point::new(40.0, 60.0));
        assert_eq!(inner[3].end(), Point::new(40.0, 40.0));
        let outer = store.boundary(Boundary::Outer);
        assert_eq!(outer[0].start(), Point::new(0.0, 0.0));
        assert!(!store.is_empty());
    }

    #[test]
    fn zero_length_segments_are_rejected() {
        let p = Point::new(3.0, 4.0);
        assert!(WallSegment::new(p, p).is_none());
        assert!(WallSegment::new(p, Point::new(f64::NAN, 0.0)).is_none());
        let seg = WallSegment::new(p, Point::new(6.0, 8.0)).unwrap();
        assert!((seg.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_vertices_are_skipped_not_fatal() {
        let mut inner = square(40.0, 60.0);
        inner.insert(1, Point::new(40.0, 40.0));
        let store = WallStore::from_cycles(&inner, &square(0.0, 100.0)).unwrap();
        assert_eq!(store.boundary(Boundary::Inner).len(), 4);
        assert!(store.segments().iter().all(|s| s.length() > 0.0));
    }

    #[test]
    fn short_boundaries_refuse_to_build() {
        let short = &square(40.0, 60.0)[..2];
        let err = WallStore::from_cycles(short, &square(0.0, 100.0)).unwrap_err();
        assert_eq!(
            err,
            TrackError::TooFewVertices {
                boundary: "inner",
                min: 3,
                got: 2,
            }
        );
    }

    #[test]
    fn collapsed_and_non_finite_cycles_refuse_to_build() {
        let collapsed = vec![
            Point::new(1.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        ];
        let err = WallStore::from_cycles(&square(40.0, 60.0), &collapsed).unwrap_err();
        assert!(matches!(err, TrackError::CollapsedCycle { boundary, .. } if boundary == "outer"));

        let mut broken = square(0.0, 100.0);
        broken[2].y = f64::INFINITY;
        assert_eq!(
            WallStore::from_cycles(&square(40.0, 60.0), &broken),
            Err(TrackError::NonFiniteVertex {
                boundary: "outer",
                index: 2,
            })
        );
    }

    #[test]
    fn bounding_box_checks_both_axes() {
        let seg = WallSegment::new(Point::new(10.0, 0.0), Point::new(0.0, 10.0)).unwrap();
        assert!(seg.bounds_contain(Point::new(5.0, 5.0), 0.0));
        assert!(!seg.bounds_contain(Point::new(11.0, 5.0), 0.0));
        assert!(!seg.bounds_contain(Point::new(5.0, -1.0), 0.0));
        assert!(seg.bounds_contain(Point::new(10.0 + 1e-12, 0.0), 1e-9));
    }

    #[test]
    fn vector_ops_behave() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, -1.0);
        assert_eq!(a + b, Point::new(4.0, 1.0));
        assert_eq!(a - b, Point::new(-2.0, 3.0));
        assert!((a.dot(b) - 1.0).abs() < 1e-12);
        assert!((a.cross(b) + 7.0).abs() < 1e-12);
        assert_eq!(a.midpoint(b), Point::new(2.0, 0.5));
    }
}
