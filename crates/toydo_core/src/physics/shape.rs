//! Body geometry.
//!
//! [`ShapeDesc`] is what callers ask for; [`Shape`] is what the world
//! simulates. Conversion clamps degenerate input instead of rejecting it.
//! Polygon vertices are stored centred on the centroid with positive
//! (counter-clockwise in `y`-up terms) winding.

use crate::math::Vec2;
use rapier2d::prelude::{point, Point, Real, SharedShape};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Smallest radius or side length a body may have.
pub const MIN_EXTENT: f32 = 1.0;

/// Points used to round one chamfered corner.
const CHAMFER_SEGMENTS: usize = 4;

/// Requested geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeDesc {
    Circle {
        radius: f32,
    },
    Rect {
        width: f32,
        height: f32,
        #[serde(default)]
        chamfer: f32,
    },
    /// Regular polygon with `sides` corners on a circle of `radius`.
    Polygon {
        sides: u32,
        radius: f32,
        #[serde(default)]
        chamfer: f32,
    },
}

/// Simulated geometry in body-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32 },
    Polygon { vertices: Vec<Vec2> },
}

fn extent(value: f32, clamped: &mut bool) -> f32 {
    if value.is_finite() && value >= MIN_EXTENT {
        value
    } else {
        *clamped = true;
        MIN_EXTENT
    }
}

fn chamfer_amount(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

impl Shape {
    /// Resolve a description. The flag is true when any input was clamped.
    pub fn from_desc(desc: &ShapeDesc) -> (Shape, bool) {
        let mut clamped = false;
        let shape = match *desc {
            ShapeDesc::Circle { radius } => Shape::Circle {
                radius: extent(radius, &mut clamped),
            },
            ShapeDesc::Rect { width, height, chamfer } => {
                let hw = extent(width, &mut clamped) * 0.5;
                let hh = extent(height, &mut clamped) * 0.5;
                let corners = vec![
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ];
                Shape::polygon(corners, chamfer_amount(chamfer), &mut clamped)
            }
            ShapeDesc::Polygon { sides, radius, chamfer } => {
                let radius = extent(radius, &mut clamped);
                if sides < 3 {
                    clamped = true;
                    Shape::Circle { radius }
                } else {
                    let theta = TAU / sides as f32;
                    let offset = theta * 0.5;
                    let corners = (0..sides)
                        .map(|i| Vec2::from_angle(offset + theta * i as f32) * radius)
                        .collect();
                    Shape::polygon(corners, chamfer_amount(chamfer), &mut clamped)
                }
            }
        };
        (shape, clamped)
    }

    fn polygon(corners: Vec<Vec2>, chamfer: f32, clamped: &mut bool) -> Shape {
        let shortest = corners
            .iter()
            .zip(corners.iter().cycle().skip(1))
            .map(|(a, b)| a.distance(*b))
            .fold(f32::INFINITY, f32::min);
        let limit = shortest * 0.5;
        let chamfer = if chamfer > limit {
            *clamped = true;
            limit
        } else {
            chamfer
        };

        let vertices = if chamfer > 0.0 {
            round_corners(&corners, chamfer)
        } else {
            corners
        };
        Shape::Polygon {
            vertices: recenter(dedupe(vertices)),
        }
    }

    pub fn area(&self) -> f32 {
        match self {
            Shape::Circle { radius } => PI * radius * radius,
            Shape::Polygon { vertices } => signed_area(vertices).abs(),
        }
    }

    /// Distance from the centroid to the farthest point of the shape.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Circle { radius } => *radius,
            Shape::Polygon { vertices } => vertices.iter().map(|v| v.length()).fold(0.0, f32::max),
        }
    }

    /// Collision geometry. A polygon whose hull collapses falls back to a
    /// ball of the same bounding radius.
    pub(crate) fn collider(&self) -> SharedShape {
        match self {
            Shape::Circle { radius } => SharedShape::ball(*radius),
            Shape::Polygon { vertices } => {
                let points: Vec<Point<Real>> = vertices.iter().map(|v| point![v.x, v.y]).collect();
                SharedShape::convex_hull(&points)
                    .unwrap_or_else(|| SharedShape::ball(self.bounding_radius().max(MIN_EXTENT)))
            }
        }
    }
}

/// Consecutive vertex pairs, wrapping around.
pub(crate) fn edges(vertices: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    vertices
        .iter()
        .enumerate()
        .map(move |(i, a)| (*a, vertices[(i + 1) % vertices.len()]))
}

fn signed_area(vertices: &[Vec2]) -> f32 {
    edges(vertices).map(|(a, b)| a.perp_dot(b)).sum::<f32>() * 0.5
}

/// Replace every corner with a short quadratic curve. Convexity is kept
/// because each curve stays inside the corner it replaces.
fn round_corners(corners: &[Vec2], chamfer: f32) -> Vec<Vec2> {
    let n = corners.len();
    let mut out = Vec::with_capacity(n * (CHAMFER_SEGMENTS + 1));
    for i in 0..n {
        let prev = corners[(i + n - 1) % n];
        let corner = corners[i];
        let next = corners[(i + 1) % n];
        let start = corner + (prev - corner).normalize_or_zero() * chamfer;
        let end = corner + (next - corner).normalize_or_zero() * chamfer;
        for step in 0..=CHAMFER_SEGMENTS {
            let t = step as f32 / CHAMFER_SEGMENTS as f32;
            let u = 1.0 - t;
            out.push(start * (u * u) + corner * (2.0 * u * t) + end * (t * t));
        }
    }
    out
}

/// Drop vertices that sit on top of their predecessor.
fn dedupe(vertices: Vec<Vec2>) -> Vec<Vec2> {
    const EPSILON: f32 = 1e-3;
    let mut out: Vec<Vec2> = Vec::with_capacity(vertices.len());
    for v in vertices {
        if out.last().is_none_or(|last| last.distance(v) > EPSILON) {
            out.push(v);
        }
    }
    while out.len() > 3 && out[0].distance(out[out.len() - 1]) <= EPSILON {
        out.pop();
    }
    out
}

fn recenter(mut vertices: Vec<Vec2>) -> Vec<Vec2> {
    let area = signed_area(&vertices);
    if area.abs() <= f32::EPSILON {
        return vertices;
    }
    let mut centroid = Vec2::ZERO;
    for (a, b) in edges(&vertices) {
        centroid += (a + b) * a.perp_dot(b);
    }
    centroid /= 6.0 * area;
    for v in &mut vertices {
        *v -= centroid;
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertices(shape: &Shape) -> &[Vec2] {
        match shape {
            Shape::Polygon { vertices } => vertices,
            Shape::Circle { .. } => panic!("expected polygon"),
        }
    }

    #[test]
    fn rect_area_and_winding() {
        let (shape, clamped) = Shape::from_desc(&ShapeDesc::Rect { width: 40.0, height: 20.0, chamfer: 0.0 });
        assert!(!clamped);
        assert!((shape.area() - 800.0).abs() < 1e-3);
        assert!(signed_area(vertices(&shape)) > 0.0);
    }

    #[test]
    fn too_few_sides_becomes_circle() {
        let (shape, clamped) = Shape::from_desc(&ShapeDesc::Polygon { sides: 2, radius: 30.0, chamfer: 0.0 });
        assert!(clamped);
        assert_eq!(shape, Shape::Circle { radius: 30.0 });
    }

    #[test]
    fn degenerate_radius_is_clamped() {
        let (shape, clamped) = Shape::from_desc(&ShapeDesc::Circle { radius: f32::NAN });
        assert!(clamped);
        assert_eq!(shape, Shape::Circle { radius: MIN_EXTENT });

        let (shape, clamped) = Shape::from_desc(&ShapeDesc::Rect { width: 0.0, height: 10.0, chamfer: 0.0 });
        assert!(clamped);
        assert!(shape.area() > 0.0);
    }

    #[test]
    fn oversized_chamfer_is_limited_to_half_an_edge() {
        let (shape, clamped) = Shape::from_desc(&ShapeDesc::Rect { width: 20.0, height: 20.0, chamfer: 50.0 });
        assert!(clamped);
        let v = vertices(&shape);
        assert!(v.len() > 4);
        assert!(shape.area() > 0.0 && shape.area() < 400.0);
        for (a, b) in edges(v) {
            assert!(a.distance(b) > 0.0);
        }
    }

    #[test]
    fn chamfered_polygon_stays_convex() {
        let (shape, _) = Shape::from_desc(&ShapeDesc::Polygon { sides: 5, radius: 40.0, chamfer: 10.0 });
        let v = vertices(&shape);
        for i in 0..v.len() {
            let a = v[i];
            let b = v[(i + 1) % v.len()];
            let c = v[(i + 2) % v.len()];
            assert!((b - a).perp_dot(c - b) >= -1e-3, "reflex corner at {b}");
        }
    }

    #[test]
    fn collider_matches_the_simulated_geometry() {
        let (circle, _) = Shape::from_desc(&ShapeDesc::Circle { radius: 12.0 });
        assert_eq!(circle.collider().as_ball().map(|b| b.radius), Some(12.0));

        let (rect, _) = Shape::from_desc(&ShapeDesc::Rect { width: 40.0, height: 20.0, chamfer: 4.0 });
        let collider = rect.collider();
        let hull = collider.as_convex_polygon().expect("convex hull");
        assert!(hull.points().len() > 4);
    }

    #[test]
    fn repeated_vertices_are_dropped() {
        let v = Vec2::new(1.0, 1.0);
        let out = dedupe(vec![Vec2::ZERO, Vec2::ZERO, v, Vec2::new(0.0, 1.0), Vec2::ZERO]);
        assert_eq!(out, vec![Vec2::ZERO, v, Vec2::new(0.0, 1.0)]);
    }
}
