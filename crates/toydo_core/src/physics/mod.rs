//! Rigid-body physics for the canvas.
//!
//! A thin canvas layer over rapier2d:
//!
//! - [`PhysicsWorld`] owns the rapier sets, addresses bodies through
//!   [`BodyHandle`]s, runs fixed 60 Hz ticks and keeps four static walls
//!   around the canvas.
//! - Shapes are circles or convex polygons (optionally chamfered); sensor
//!   bodies move but never collide.
//! - Bodies may carry a target point; [`forces`] floats them toward it and
//!   holds them there once settled.
//! - Pointer drags are springs addressed by [`ConstraintHandle`].
//!
//! The canvas API speaks canvas units and milliseconds; rapier runs in
//! seconds, so velocities and accelerations are scaled at the boundary.
//!
//! A body whose state turns non-finite is frozen in place and reported in
//! the [`StepReport`]; the rest of the world keeps running.

mod body;
mod constraint;
pub mod forces;
mod handle;
mod shape;
mod world;

pub use body::{Body, BodyDesc, BodySnapshot, Material};
pub use constraint::DragConstraint;
pub use forces::TargetForces;
pub use handle::{BodyHandle, ConstraintHandle};
pub use shape::{Shape, ShapeDesc, MIN_EXTENT};
pub use world::{PhysicsWorld, StepReport, WallSide};

use crate::math::Vec2;
use rapier2d::prelude::{vector, Real, Vector};
use thiserror::Error;

/// Milliseconds per rapier time unit.
pub(crate) const MS_PER_S: f32 = 1000.0;

pub(crate) fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

pub(crate) fn from_na(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("world bounds {width} x {height} must be finite and positive")]
    InvalidBounds { width: f32, height: f32 },

    #[error("position {position} is not finite")]
    NonFinitePosition { position: Vec2 },

    #[error("body {0:?} does not exist")]
    UnknownBody(BodyHandle),

    #[error("constraint {0:?} does not exist")]
    UnknownConstraint(ConstraintHandle),

    #[error("body {0:?} is static and cannot be dragged")]
    StaticBody(BodyHandle),

    #[error("body {0:?} is frozen")]
    FrozenBody(BodyHandle),
}
