//! Collision and intersection geometry
//!
//! Minimum-translation vectors for circle-vs-shape overlap, nearest-hit
//! queries for segments against circles, rectangles and polygons, and the
//! rays fan used for vision. Every function here is total: "no overlap" and
//! "no hit" are ordinary results.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_RAYS_IN_FAN;
use crate::polar_to_cartesian;

const EPSILON: f32 = 1e-6;

/// Axis-aligned rectangle, `(x, y)` is the min corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let min = center - size * 0.5;
        Self::new(min.x, min.y, size.x, size.y)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min() + self.max()) * 0.5
    }

    /// Closed containment (boundary counts as inside)
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Corners in winding order: top-left, top-right, bottom-right, bottom-left
    pub fn corners(&self) -> [Vec2; 4] {
        let (min, max) = (self.min(), self.max());
        [
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ]
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }
}

// ---------------------------------------------------------------------------
// Orientation helpers

/// Unit vector pointing along `orientation` (radians)
#[inline]
pub fn orientation_vec(orientation: f32) -> Vec2 {
    polar_to_cartesian(1.0, orientation)
}

/// Angle of `v` measured from +X, in (-π, π]
#[inline]
pub fn vec_orientation(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Rotate 90° counter-clockwise
#[inline]
pub fn rotate_90(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

#[inline]
pub fn flip(v: Vec2) -> Vec2 {
    -v
}

// ---------------------------------------------------------------------------
// Minimum translation vectors

/// Push circle 0 out of circle 1 along the center axis.
///
/// Returns zero when the circles don't overlap (touching is not overlap).
/// Coincident centers separate along +X.
pub fn circle_circle_mtv(position0: Vec2, radius0: f32, position1: Vec2, radius1: f32) -> Vec2 {
    let delta = position0 - position1;
    let dist = delta.length();
    let penetration = radius0 + radius1 - dist;
    if penetration <= 0.0 {
        return Vec2::ZERO;
    }
    if dist < EPSILON {
        return Vec2::X * (radius0 + radius1);
    }
    delta / dist * penetration
}

/// Push a circle out of an axis-aligned rectangle.
///
/// Outside: away from the nearest point on the rectangle. Inside (or on the
/// boundary): out through the nearest edge, so the circle ends up touching it.
pub fn circle_rect_mtv(position: Vec2, radius: f32, rect: Rect) -> Vec2 {
    let (min, max) = (rect.min(), rect.max());
    let nearest = position.clamp(min, max);
    let delta = position - nearest;
    let dist = delta.length();

    if dist >= EPSILON {
        if dist >= radius {
            return Vec2::ZERO;
        }
        return delta / dist * (radius - dist);
    }

    // Center inside: nearest edge wins, ties in left, right, top, bottom order
    let candidates = [
        (position.x - min.x, Vec2::NEG_X),
        (max.x - position.x, Vec2::X),
        (position.y - min.y, Vec2::NEG_Y),
        (max.y - position.y, Vec2::Y),
    ];
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.0 < best.0 {
            best = *candidate;
        }
    }
    best.1 * (best.0 + radius)
}

/// Push a circle out of a convex polygon (separating axis test).
///
/// Axes are the polygon edge normals plus the axis from the closest vertex to
/// the circle center. Fewer than three vertices never collide.
pub fn circle_polygon_mtv(position: Vec2, radius: f32, vertices: &[Vec2]) -> Vec2 {
    let n = vertices.len();
    if n < 3 {
        return Vec2::ZERO;
    }

    let centroid = vertices.iter().copied().sum::<Vec2>() / n as f32;
    let mut axes: Vec<Vec2> = (0..n)
        .map(|i| rotate_90(vertices[(i + 1) % n] - vertices[i]).normalize_or_zero())
        .filter(|a| *a != Vec2::ZERO)
        .collect();

    let closest = vertices
        .iter()
        .copied()
        .min_by(|a, b| {
            a.distance_squared(position)
                .partial_cmp(&b.distance_squared(position))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(centroid);
    let vertex_axis = (position - closest).normalize_or_zero();
    if vertex_axis != Vec2::ZERO {
        axes.push(vertex_axis);
    }

    let mut min_overlap = f32::INFINITY;
    let mut min_axis = Vec2::ZERO;
    for axis in axes {
        let (poly_min, poly_max) = vertices.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            let p = v.dot(axis);
            (lo.min(p), hi.max(p))
        });
        let c = position.dot(axis);
        let overlap = (poly_max - (c - radius)).min((c + radius) - poly_min);
        if overlap <= 0.0 {
            return Vec2::ZERO;
        }
        if overlap < min_overlap {
            min_overlap = overlap;
            min_axis = axis;
        }
    }

    // Orient the push away from the polygon
    if (position - centroid).dot(min_axis) < 0.0 {
        min_axis = -min_axis;
    }
    min_axis * min_overlap
}

// ---------------------------------------------------------------------------
// Segment queries

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Intersection point of two segments, `None` when they miss or are parallel
pub fn segment_segment_intersection(start0: Vec2, end0: Vec2, start1: Vec2, end1: Vec2) -> Option<Vec2> {
    let r = end0 - start0;
    let s = end1 - start1;
    let denom = cross(r, s);
    if denom.abs() < EPSILON {
        return None;
    }
    let qp = start1 - start0;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(start0 + r * t)
    } else {
        None
    }
}

/// Up to two segment/circle crossing points, ordered along the segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleHits {
    points: [Vec2; 2],
    count: usize,
}

impl CircleHits {
    const NONE: Self = Self {
        points: [Vec2::ZERO; 2],
        count: 0,
    };

    fn push(&mut self, p: Vec2) {
        self.points[self.count] = p;
        self.count += 1;
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.count]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Points where segment `start..end` crosses the circle boundary.
///
/// Solves |start + t·d - center|² = r² and keeps roots with t in [0, 1]. A
/// tangent segment yields exactly one point.
pub fn segment_circle_intersections(start: Vec2, end: Vec2, position: Vec2, radius: f32) -> CircleHits {
    let d = end - start;
    let f = start - position;
    let a = d.dot(d);
    if a < EPSILON {
        return CircleHits::NONE;
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return CircleHits::NONE;
    }

    let root = discriminant.sqrt();
    let t0 = (-b - root) / (2.0 * a);
    let t1 = (-b + root) / (2.0 * a);

    let mut hits = CircleHits::NONE;
    if (0.0..=1.0).contains(&t0) {
        hits.push(start + d * t0);
    }
    if root > 0.0 && (0.0..=1.0).contains(&t1) {
        hits.push(start + d * t1);
    }
    hits
}

/// Crossing point nearest to `start`
pub fn segment_circle_nearest(start: Vec2, end: Vec2, position: Vec2, radius: f32) -> Option<Vec2> {
    nearest_to(start, segment_circle_intersections(start, end, position, radius).points().iter().copied())
}

/// Nearest crossing of the segment with the closed polygon outline
pub fn segment_polygon_nearest(start: Vec2, end: Vec2, vertices: &[Vec2]) -> Option<Vec2> {
    let n = vertices.len();
    if n < 2 {
        return None;
    }
    nearest_to(
        start,
        (0..n).filter_map(|i| segment_segment_intersection(start, end, vertices[i], vertices[(i + 1) % n])),
    )
}

/// Nearest crossing of the segment with the rectangle's four edges
pub fn segment_rect_nearest(start: Vec2, end: Vec2, rect: Rect) -> Option<Vec2> {
    segment_polygon_nearest(start, end, &rect.corners())
}

/// Whether the swept segment reaches the circle: it crosses the boundary or
/// ends inside it.
pub fn segment_touches_circle(start: Vec2, end: Vec2, position: Vec2, radius: f32) -> bool {
    end.distance_squared(position) <= radius * radius
        || !segment_circle_intersections(start, end, position, radius).is_empty()
}

/// Whether the swept segment reaches the rectangle: it crosses an edge or
/// ends inside it.
pub fn segment_touches_rect(start: Vec2, end: Vec2, rect: Rect) -> bool {
    rect.contains(end) || segment_rect_nearest(start, end, rect).is_some()
}

fn nearest_to(origin: Vec2, points: impl Iterator<Item = Vec2>) -> Option<Vec2> {
    points.min_by(|a, b| {
        a.distance_squared(origin)
            .partial_cmp(&b.distance_squared(origin))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

// ---------------------------------------------------------------------------
// Rays fan

/// Evenly spread sensing rays from a single origin
#[derive(Debug, Clone, Copy)]
pub struct RaysFan {
    pub start: Vec2,
    ends: [Vec2; MAX_RAYS_IN_FAN],
    n: usize,
}

impl RaysFan {
    #[inline]
    pub fn ends(&self) -> &[Vec2] {
        &self.ends[..self.n]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// Build `n` rays of `length` spread over `span_angle`, centered on `orientation`.
///
/// One ray points straight along `orientation`. For `n > 1` the first and
/// last rays sit at `orientation ∓ span_angle / 2`. Requests above
/// [`MAX_RAYS_IN_FAN`] are clamped: the fan still covers the full span, with
/// the maximum number of rays.
pub fn rays_fan(start: Vec2, n: usize, length: f32, span_angle: f32, orientation: f32) -> RaysFan {
    let n = if n > MAX_RAYS_IN_FAN {
        log::warn!("rays fan of {} clamped to {} rays", n, MAX_RAYS_IN_FAN);
        MAX_RAYS_IN_FAN
    } else {
        n
    };

    let mut fan = RaysFan {
        start,
        ends: [start; MAX_RAYS_IN_FAN],
        n,
    };
    match n {
        0 => {}
        1 => fan.ends[0] = start + polar_to_cartesian(length, orientation),
        _ => {
            let step = span_angle / (n - 1) as f32;
            let first = orientation - 0.5 * span_angle;
            for (i, end) in fan.ends[..n].iter_mut().enumerate() {
                *end = start + polar_to_cartesian(length, first + i as f32 * step);
            }
        }
    }
    fan
}
