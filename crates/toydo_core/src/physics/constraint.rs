//! Pointer drag springs.
//!
//! A drag is a kinematic pointer body joined to the grabbed body by a
//! zero-length spring. The pointer body has no collider; moving the pointer
//! teleports it and the spring pulls the grab point after it.

use super::handle::BodyHandle;
use crate::math::{rotate, Vec2};
use rapier2d::prelude::RigidBodyHandle;

/// Spring between a pointer and a point fixed on a body.
#[derive(Debug, Clone, PartialEq)]
pub struct DragConstraint {
    pub(crate) body: BodyHandle,
    pub(crate) pointer_body: RigidBodyHandle,
    /// Grab point in body-local coordinates.
    pub(crate) local_anchor: Vec2,
    pub(crate) pointer: Vec2,
}

impl DragConstraint {
    pub(crate) fn new(
        body: BodyHandle,
        pointer_body: RigidBodyHandle,
        body_position: Vec2,
        body_angle: f32,
        anchor: Vec2,
    ) -> Self {
        Self {
            body,
            pointer_body,
            local_anchor: rotate(anchor - body_position, -body_angle),
            pointer: anchor,
        }
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Grab point in world coordinates for a body pose.
    pub fn world_anchor(&self, position: Vec2, angle: f32) -> Vec2 {
        position + rotate(self.local_anchor, angle)
    }
}

/// Spring coefficients for an acceleration-based joint. `stiffness` is the
/// share of the stretch and `damping` the share of the anchor's relative
/// speed removed per tick of `dt` seconds.
pub(crate) fn spring_coefficients(stiffness: f32, damping: f32, dt: f32) -> (f32, f32) {
    if dt <= 0.0 {
        return (0.0, 0.0);
    }
    let stiffness = stiffness.clamp(0.0, 1.0);
    let damping = damping.clamp(0.0, 1.0);
    (stiffness / (dt * dt), damping / dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(anchor: Vec2, angle: f32) -> DragConstraint {
        DragConstraint::new(
            BodyHandle::from_raw_parts(0, 0),
            RigidBodyHandle::from_raw_parts(1, 0),
            Vec2::ZERO,
            angle,
            anchor,
        )
    }

    #[test]
    fn anchor_follows_body_rotation() {
        let c = constraint(Vec2::new(10.0, 0.0), 0.0);
        let anchor = c.world_anchor(Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        assert!((anchor - Vec2::new(0.0, 10.0)).length() < 1e-4);
    }

    #[test]
    fn grab_point_is_stored_in_body_space() {
        let c = constraint(Vec2::new(0.0, 10.0), std::f32::consts::FRAC_PI_2);
        assert!((c.local_anchor - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert_eq!(c.pointer(), Vec2::new(0.0, 10.0));
    }

    #[test]
    fn coefficients_scale_with_the_tick() {
        let dt = 1.0 / 60.0;
        let (k, c) = spring_coefficients(0.1, 0.1, dt);
        assert!((k * dt * dt - 0.1).abs() < 1e-5);
        assert!((c * dt - 0.1).abs() < 1e-5);
        assert_eq!(spring_coefficients(5.0, -1.0, dt).1, 0.0);
        assert_eq!(spring_coefficients(0.1, 0.1, 0.0), (0.0, 0.0));
    }
}
