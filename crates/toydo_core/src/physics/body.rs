//! Rigid bodies, their spawn descriptions and read-only snapshots.

use super::handle::BodyHandle;
use super::shape::{Shape, ShapeDesc};
use super::{from_na, MS_PER_S};
use crate::config::{BLOCK_RADIUS, BUBBLE_RADIUS, BUOYANCY};
use crate::math::Vec2;
use rapier2d::prelude::{Real, RigidBody};
use serde::{Deserialize, Serialize};

/// Highest per-tick velocity loss a material may ask for.
const MAX_AIR_FRICTION: f32 = 0.99;

/// Surface and mass properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    /// Fraction of velocity lost per fixed tick.
    pub air_friction: f32,
    /// Mass per unit area.
    pub density: f32,
    /// Upward force per unit area while unsettled.
    pub buoyancy: f32,
}

impl Material {
    pub const BUBBLE: Material = Material {
        restitution: 0.7,
        friction: 0.2,
        air_friction: 0.2,
        density: 0.001,
        buoyancy: BUOYANCY,
    };

    pub const BLOCK: Material = Material {
        restitution: 0.0,
        friction: 0.1,
        air_friction: 0.01,
        density: 0.001,
        buoyancy: 0.0,
    };

    pub const WALL: Material = Material {
        restitution: 0.0,
        friction: 0.1,
        air_friction: 0.0,
        density: 0.001,
        buoyancy: 0.0,
    };

    /// Linear damping coefficient that removes `air_friction` of the
    /// velocity over one tick of `dt` seconds.
    pub fn damping(&self, dt: Real) -> Real {
        if dt <= 0.0 || !self.air_friction.is_finite() {
            return 0.0;
        }
        let loss = self.air_friction.clamp(0.0, MAX_AIR_FRICTION);
        (1.0 / (1.0 - loss) - 1.0) / dt
    }

    /// Mass per unit area, falling back to block density when unusable.
    pub fn effective_density(&self) -> f32 {
        if self.density.is_finite() && self.density > 0.0 {
            self.density
        } else {
            Material::BLOCK.density
        }
    }

    /// Same material with buoyancy taken from tuning.
    pub fn with_buoyancy(mut self, buoyancy: f32) -> Self {
        self.buoyancy = buoyancy;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::BLOCK
    }
}

/// Everything needed to spawn a body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc<P> {
    pub shape: ShapeDesc,
    pub position: Vec2,
    pub angle: f32,
    pub material: Material,
    pub is_static: bool,
    /// `false` makes the body a sensor: it moves but never collides.
    pub collides: bool,
    pub target: Option<Vec2>,
    pub payload: Option<P>,
}

impl<P> BodyDesc<P> {
    pub fn new(shape: ShapeDesc) -> Self {
        Self {
            shape,
            position: Vec2::ZERO,
            angle: 0.0,
            material: Material::default(),
            is_static: false,
            collides: true,
            target: None,
            payload: None,
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(ShapeDesc::Circle { radius })
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Self::new(ShapeDesc::Rect { width, height, chamfer: 0.0 })
    }

    pub fn polygon(sides: u32, radius: f32) -> Self {
        Self::new(ShapeDesc::Polygon { sides, radius, chamfer: 0.0 })
    }

    /// A bubble marker: sensor circle with bubble material.
    pub fn bubble() -> Self {
        Self::circle(BUBBLE_RADIUS).with_material(Material::BUBBLE).sensor()
    }

    /// A plain block of nominal size.
    pub fn block() -> Self {
        Self::circle(BLOCK_RADIUS).with_material(Material::BLOCK)
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_shape(mut self, shape: ShapeDesc) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.collides = false;
        self
    }

    pub fn with_target(mut self, target: Vec2) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Canvas-side state the world keeps next to each rapier body.
#[derive(Debug, Clone)]
pub(crate) struct BodyState<P> {
    pub(crate) shape: Shape,
    pub(crate) material: Material,
    pub(crate) area: f32,
    pub(crate) mass: f32,
    pub(crate) is_static: bool,
    pub(crate) collides: bool,
    pub(crate) frozen: bool,
    pub(crate) target: Option<Vec2>,
    pub(crate) payload: Option<P>,
    pub(crate) spawn_seq: u64,
    pub(crate) prev_position: Vec2,
    pub(crate) prev_angle: f32,
}

impl<P> BodyState<P> {
    pub(crate) fn from_desc(shape: Shape, desc: BodyDesc<P>, angle: f32, spawn_seq: u64) -> Self {
        let area = shape.area();
        Self {
            mass: area * desc.material.effective_density(),
            shape,
            material: desc.material,
            area,
            is_static: desc.is_static,
            collides: desc.collides,
            frozen: false,
            target: desc.target,
            payload: desc.payload,
            spawn_seq,
            prev_position: desc.position,
            prev_angle: angle,
        }
    }
}

/// A body as seen through the world: rapier's pose and velocity joined with
/// the canvas state. Velocities are in units per millisecond.
#[derive(Debug)]
pub struct Body<'w, P> {
    pub(crate) rigid: &'w RigidBody,
    pub(crate) state: &'w BodyState<P>,
}

impl<P> Clone for Body<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Body<'_, P> {}

impl<'w, P> Body<'w, P> {
    pub fn shape(&self) -> &'w Shape {
        &self.state.shape
    }

    pub fn position(&self) -> Vec2 {
        from_na(self.rigid.translation())
    }

    pub fn angle(&self) -> f32 {
        self.rigid.rotation().angle()
    }

    pub fn velocity(&self) -> Vec2 {
        from_na(self.rigid.linvel()) / MS_PER_S
    }

    pub fn angular_velocity(&self) -> f32 {
        self.rigid.angvel() / MS_PER_S
    }

    pub fn material(&self) -> &'w Material {
        &self.state.material
    }

    pub fn mass(&self) -> f32 {
        self.state.mass
    }

    pub fn area(&self) -> f32 {
        self.state.area
    }

    pub fn is_static(&self) -> bool {
        self.state.is_static
    }

    pub fn collides(&self) -> bool {
        self.state.collides
    }

    pub fn is_frozen(&self) -> bool {
        self.state.frozen
    }

    pub fn target(&self) -> Option<Vec2> {
        self.state.target
    }

    pub fn payload(&self) -> Option<&'w P> {
        self.state.payload.as_ref()
    }

    /// Position and angle blended between the previous and current tick.
    pub fn interpolated(&self, alpha: f32) -> (Vec2, f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let (prev_position, prev_angle) = (self.state.prev_position, self.state.prev_angle);
        (
            prev_position.lerp(self.position(), alpha),
            prev_angle + (self.angle() - prev_angle) * alpha,
        )
    }
}

/// Read-only copy of a body for the view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySnapshot<P> {
    pub handle: BodyHandle,
    pub position: Vec2,
    pub angle: f32,
    pub shape: Shape,
    pub is_static: bool,
    pub frozen: bool,
    pub payload: Option<P>,
}

impl<P: Clone> BodySnapshot<P> {
    pub(crate) fn of(handle: BodyHandle, body: Body<'_, P>, alpha: f32) -> Self {
        let (position, angle) = body.interpolated(alpha);
        Self {
            handle,
            position,
            angle,
            shape: body.state.shape.clone(),
            is_static: body.state.is_static,
            frozen: body.state.frozen,
            payload: body.state.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d::prelude::{vector, RigidBodyBuilder};

    fn state(desc: BodyDesc<()>) -> BodyState<()> {
        let (shape, _) = Shape::from_desc(&desc.shape);
        BodyState::from_desc(shape, desc, 0.0, 0)
    }

    #[test]
    fn mass_follows_density() {
        let body = state(BodyDesc::rect(10.0, 20.0).with_material(Material::BUBBLE));
        assert!((body.mass - 200.0 * 0.001).abs() < 1e-6);
    }

    #[test]
    fn unusable_density_falls_back_to_blocks() {
        let material = Material { density: f32::NAN, ..Material::BUBBLE };
        let body = state(BodyDesc::rect(10.0, 10.0).with_material(material));
        assert!((body.mass - 100.0 * Material::BLOCK.density).abs() < 1e-6);
    }

    #[test]
    fn damping_removes_air_friction_per_tick() {
        let dt = 1.0 / 60.0;
        let damping = Material::BUBBLE.damping(dt);
        // Rapier scales velocity by 1 / (1 + dt * damping) each step.
        assert!((1.0 / (1.0 + dt * damping) - 0.8).abs() < 1e-5);
        assert_eq!(Material::WALL.damping(dt), 0.0);
        let runaway = Material { air_friction: 4.0, ..Material::BLOCK };
        assert!(runaway.damping(dt).is_finite());
    }

    #[test]
    fn interpolation_blends_previous_tick() {
        let state = state(BodyDesc::circle(5.0));
        let rigid = RigidBodyBuilder::dynamic().translation(vector![10.0, 0.0]).build();
        let body = Body { rigid: &rigid, state: &state };
        let (position, _) = body.interpolated(0.25);
        assert!((position.x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn velocity_is_reported_per_millisecond() {
        let state = state(BodyDesc::circle(5.0));
        let rigid = RigidBodyBuilder::dynamic().linvel(vector![500.0, 0.0]).build();
        let body = Body { rigid: &rigid, state: &state };
        assert!((body.velocity().x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bubble_preset_is_a_sensor() {
        let desc: BodyDesc<u32> = BodyDesc::bubble().with_payload(3);
        assert!(!desc.collides);
        assert_eq!(desc.material, Material::BUBBLE);
        assert_eq!(desc.payload, Some(3));
    }
}
