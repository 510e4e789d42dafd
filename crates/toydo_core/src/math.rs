//! Canvas math utilities
//!
//! Re-exports glam with the canvas rectangle types and the seeded RNG used
//! by every randomized subsystem.

pub use glam::*;

use rand::SeedableRng;

/// Seeded random number generator shared by the sampler and the world.
pub type SimRng = rand::rngs::StdRng;

pub fn seeded_rng(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}

/// Canvas size in canvas-local units. Origin is the top-left corner, `y`
/// grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    /// The canvas shrunk by `margin` on every side.
    pub fn shrink(&self, margin: f32) -> Rect {
        let m = Vec2::splat(margin.max(0.0));
        Rect::new(m, Vec2::new(self.width, self.height) - m)
    }
}

/// Axis-aligned rectangle. Empty when `max < min` on either axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        !(self.max.x >= self.min.x && self.max.y >= self.min.y)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Rotate `v` by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_keeps_margin_on_every_side() {
        let rect = Bounds::new(400.0, 800.0).shrink(50.0);
        assert_eq!(rect.min, Vec2::new(50.0, 50.0));
        assert_eq!(rect.max, Vec2::new(350.0, 750.0));
        assert!(rect.contains(Vec2::new(50.0, 750.0)));
        assert!(!rect.contains(Vec2::new(49.9, 100.0)));
    }

    #[test]
    fn oversized_margin_yields_empty_rect() {
        assert!(Bounds::new(80.0, 80.0).shrink(50.0).is_empty());
    }

    #[test]
    fn invalid_bounds_detected() {
        assert!(!Bounds::new(0.0, 10.0).is_valid());
        assert!(!Bounds::new(f32::NAN, 10.0).is_valid());
        assert!(Bounds::new(1.0, 1.0).is_valid());
    }

    #[test]
    fn rotate_quarter_turn() {
        let v = rotate(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!((v - Vec2::Y).length() < 1e-6);
    }
}
