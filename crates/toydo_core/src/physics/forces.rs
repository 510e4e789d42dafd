//! Continuous per-body forces: buoyancy, target attraction, settling.

use crate::config::Tuning;
use crate::math::{SimRng, Vec2};
use rand::Rng;

/// Strengths of the forces that pull a body toward its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetForces {
    pub attraction: f32,
    pub stabilizing: f32,
    pub settle_distance: f32,
    pub jitter: f32,
}

impl TargetForces {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            attraction: tuning.attraction_strength,
            stabilizing: tuning.stabilizing_strength,
            settle_distance: tuning.settle_distance,
            jitter: tuning.jitter_strength,
        }
    }

    /// Force on a body at `position`. Untargeted or distant bodies float up
    /// (and are drawn toward the target if they have one); settled bodies
    /// are held in place with a small random wobble.
    pub fn force(
        &self,
        position: Vec2,
        target: Option<Vec2>,
        mass: f32,
        area: f32,
        buoyancy: f32,
        rng: &mut SimRng,
    ) -> Vec2 {
        let lift = Vec2::new(0.0, -buoyancy * area);
        let Some(target) = target else {
            return lift;
        };

        let to_target = target - position;
        if to_target.length() > self.settle_distance {
            lift + to_target * (self.attraction * mass)
        } else {
            let jitter = Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5)
                * (self.jitter * area);
            to_target * (self.stabilizing * mass) + jitter
        }
    }
}

impl Default for TargetForces {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

/// True once `position` is within `settle_distance` of `target`.
pub fn is_settled(position: Vec2, target: Vec2, settle_distance: f32) -> bool {
    position.distance(target) <= settle_distance
}
