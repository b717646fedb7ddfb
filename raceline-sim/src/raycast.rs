//! Nearest forward intersection between a ray and the wall set.
use crate::constants::BOUNDS_EPSILON;
use crate::geometry::{Point, WallSegment};

/// Relative tolerance under which a ray and a segment count as parallel.
const PARALLEL_EPSILON: f64 = 1e-10;

/// The nearest wall struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Point,
    pub distance: f64,
    pub wall_index: usize,
}

/// Closest forward intersection of the ray from `origin` along `heading`.
///
/// Returns `origin` itself when nothing lies ahead, which yields a zero-length
/// reading downstream.
#[must_use]
pub fn cast(origin: Point, heading: f64, walls: &[WallSegment]) -> Point {
    cast_hit(origin, heading, walls).map_or(origin, |hit| hit.point)
}

/// Like [`cast`], but reports which wall was hit and how far away it is.
#[must_use]
pub fn cast_hit(origin: Point, heading: f64, walls: &[WallSegment]) -> Option<RayHit> {
    let direction = Point::from_angle(heading);
    let mut nearest: Option<RayHit> = None;

    for (wall_index, wall) in walls.iter().enumerate() {
        let Some(point) = line_intersection(origin, direction, wall) else {
            continue;
        };
        if !wall.bounds_contain(point, tolerance(point)) {
            continue;
        }
        if (point - origin).dot(direction) < 0.0 {
            continue;
        }
        let distance = origin.distance(point);
        if nearest.is_none_or(|best| distance < best.distance) {
            nearest = Some(RayHit {
                point,
                distance,
                wall_index,
            });
        }
    }

    nearest
}

/// Intersection of the ray's carrier line with the wall's carrier line.
fn line_intersection(origin: Point, direction: Point, wall: &WallSegment) -> Option<Point> {
    let wall_dir = wall.direction();
    let denom = direction.cross(wall_dir);
    if denom.abs() <= PARALLEL_EPSILON * wall_dir.length() {
        return None;
    }
    let t = (wall.start() - origin).cross(wall_dir) / denom;
    let point = origin + direction * t;
    point.is_finite().then_some(point)
}

fn tolerance(point: Point) -> f64 {
    BOUNDS_EPSILON * (1.0 + point.x.abs().max(point.y.abs()))
}
