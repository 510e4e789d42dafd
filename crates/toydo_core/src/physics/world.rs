//! The physics world: rapier sets, walls, drags and the fixed tick.

use super::body::{Body, BodyDesc, BodySnapshot, BodyState, Material};
use super::constraint::{spring_coefficients, DragConstraint};
use super::forces::TargetForces;
use super::handle::{BodyHandle, ConstraintHandle};
use super::shape::{Shape, ShapeDesc};
use super::{from_na, to_na, PhysicsError, MS_PER_S};
use crate::config::Tuning;
use crate::math::{seeded_rng, Bounds, SimRng, Vec2};
use crate::task::TaskId;
use crate::time::{SimulationTime, TICK_DURATION_MS};
use rapier2d::prelude::{
    point, vector, CCDSolver, ColliderBuilder, ColliderSet, CoefficientCombineRule, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, Isometry, MotorModel, MultibodyJointSet,
    NarrowPhase, PhysicsPipeline, QueryFilter, QueryPipeline, RigidBodyBuilder, RigidBodyHandle,
    RigidBodySet, SpringJointBuilder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, warn};

/// Canvas units per rapier length unit; scales the solver's tolerances.
const LENGTH_UNIT: f32 = 50.0;

/// One of the four static walls around the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [WallSide::Top, WallSide::Bottom, WallSide::Left, WallSide::Right];

    /// Center and size of this wall for a canvas. Walls sit just outside
    /// the visible area and overlap each other at the corners.
    pub fn layout(self, bounds: Bounds, thickness: f32) -> (Vec2, Vec2) {
        let (w, h, t) = (bounds.width, bounds.height, thickness);
        match self {
            WallSide::Top => (Vec2::new(w * 0.5, -t * 0.5), Vec2::new(w + 2.0 * t, t)),
            WallSide::Bottom => (Vec2::new(w * 0.5, h + t * 0.5), Vec2::new(w + 2.0 * t, t)),
            WallSide::Left => (Vec2::new(-t * 0.5, h * 0.5), Vec2::new(t, h + 2.0 * t)),
            WallSide::Right => (Vec2::new(w + t * 0.5, h * 0.5), Vec2::new(t, h + 2.0 * t)),
        }
    }
}

/// What a call to [`PhysicsWorld::step`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Fixed ticks run.
    pub substeps: u32,
    /// Interpolation factor for rendering.
    pub alpha: f32,
    /// Bodies frozen for non-finite state during this call.
    pub frozen: Vec<BodyHandle>,
}

/// Rigid-body world for the canvas. `P` is the payload carried by each
/// body, normally the task id it renders.
pub struct PhysicsWorld<P = TaskId> {
    bounds: Bounds,
    wall_thickness: f32,
    walls: [BodyHandle; 4],
    gravity: Vec2,
    spawn_seq: u64,

    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    pub(crate) states: HashMap<BodyHandle, BodyState<P>>,
    drags: HashMap<ConstraintHandle, DragConstraint>,

    forces: TargetForces,
    drag_stiffness: f32,
    drag_damping: f32,
    clock: SimulationTime,
    rng: SimRng,
}

// The pipeline only holds scratch buffers, so a clone starts a fresh one.
impl<P: Clone> Clone for PhysicsWorld<P> {
    fn clone(&self) -> Self {
        Self {
            bounds: self.bounds,
            wall_thickness: self.wall_thickness,
            walls: self.walls,
            gravity: self.gravity,
            spawn_seq: self.spawn_seq,
            params: self.params,
            pipeline: PhysicsPipeline::new(),
            islands: self.islands.clone(),
            broad_phase: self.broad_phase.clone(),
            narrow_phase: self.narrow_phase.clone(),
            rigid_bodies: self.rigid_bodies.clone(),
            colliders: self.colliders.clone(),
            impulse_joints: self.impulse_joints.clone(),
            multibody_joints: self.multibody_joints.clone(),
            ccd_solver: self.ccd_solver.clone(),
            query_pipeline: self.query_pipeline.clone(),
            states: self.states.clone(),
            drags: self.drags.clone(),
            forces: self.forces,
            drag_stiffness: self.drag_stiffness,
            drag_damping: self.drag_damping,
            clock: self.clock.clone(),
            rng: self.rng.clone(),
        }
    }
}

impl<P> fmt::Debug for PhysicsWorld<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bounds", &self.bounds)
            .field("gravity", &self.gravity)
            .field("bodies", &self.states.len())
            .field("drags", &self.drags.len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<P: Clone> PhysicsWorld<P> {
    /// Create a world with walls around `bounds`. Gravity starts at zero.
    pub fn new(bounds: Bounds, tuning: &Tuning) -> Result<Self, PhysicsError> {
        if !bounds.is_valid() {
            return Err(PhysicsError::InvalidBounds {
                width: bounds.width,
                height: bounds.height,
            });
        }

        let mut world = Self {
            bounds,
            wall_thickness: tuning.wall_thickness.max(1.0),
            walls: [BodyHandle(RigidBodyHandle::invalid()); 4],
            gravity: Vec2::ZERO,
            spawn_seq: 0,
            params: IntegrationParameters {
                dt: TICK_DURATION_MS / MS_PER_S,
                length_unit: LENGTH_UNIT,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            states: HashMap::new(),
            drags: HashMap::new(),
            forces: TargetForces::from_tuning(tuning),
            drag_stiffness: tuning.drag_stiffness,
            drag_damping: tuning.drag_damping,
            clock: SimulationTime::new(),
            rng: seeded_rng(tuning.seed),
        };

        for (slot, side) in WallSide::ALL.into_iter().enumerate() {
            let (center, size) = side.layout(bounds, world.wall_thickness);
            let desc = BodyDesc::rect(size.x, size.y)
                .at(center)
                .with_material(Material::WALL)
                .fixed();
            world.walls[slot] = world.spawn(desc)?;
        }
        Ok(world)
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Move the walls to fit new bounds.
    pub fn resize(&mut self, bounds: Bounds) -> Result<(), PhysicsError> {
        if !bounds.is_valid() {
            return Err(PhysicsError::InvalidBounds {
                width: bounds.width,
                height: bounds.height,
            });
        }
        self.bounds = bounds;
        for (side, handle) in WallSide::ALL.into_iter().zip(self.walls) {
            let (center, size) = side.layout(bounds, self.wall_thickness);
            let (shape, _) = Shape::from_desc(&ShapeDesc::Rect {
                width: size.x,
                height: size.y,
                chamfer: 0.0,
            });
            let (Some(state), Some(rigid)) = (self.states.get_mut(&handle), self.rigid_bodies.get_mut(handle.0))
            else {
                continue;
            };
            rigid.set_translation(to_na(center), true);
            for collider in rigid.colliders() {
                if let Some(collider) = self.colliders.get_mut(*collider) {
                    collider.set_shape(shape.collider());
                }
            }
            state.area = shape.area();
            state.shape = shape;
            state.prev_position = center;
        }
        debug!(width = bounds.width, height = bounds.height, "world resized");
        Ok(())
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Constant acceleration (units / ms²) applied to every dynamic body.
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = if gravity.is_finite() { gravity } else { Vec2::ZERO };
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick_count()
    }

    /// Interpolation factor left over from the last step.
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }

    pub fn walls(&self) -> [(WallSide, BodyHandle); 4] {
        [
            (WallSide::Top, self.walls[0]),
            (WallSide::Bottom, self.walls[1]),
            (WallSide::Left, self.walls[2]),
            (WallSide::Right, self.walls[3]),
        ]
    }

    pub fn wall_side(&self, handle: BodyHandle) -> Option<WallSide> {
        self.walls().into_iter().find(|(_, h)| *h == handle).map(|(side, _)| side)
    }

    /// Bodies other than the walls.
    pub fn body_count(&self) -> usize {
        self.states.len().saturating_sub(self.walls.len())
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.states.contains_key(&handle)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<Body<'_, P>> {
        let state = self.states.get(&handle)?;
        let rigid = self.rigid_bodies.get(handle.0)?;
        Some(Body { rigid, state })
    }

    /// Every live body, walls included, in slot order. Drag pointers are
    /// not bodies.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, Body<'_, P>)> {
        self.rigid_bodies.iter().filter_map(|(handle, rigid)| {
            let handle = BodyHandle(handle);
            self.states.get(&handle).map(|state| (handle, Body { rigid, state }))
        })
    }

    /// Add a body. Degenerate geometry is clamped; a non-finite position is
    /// refused.
    pub fn spawn(&mut self, mut desc: BodyDesc<P>) -> Result<BodyHandle, PhysicsError> {
        if !desc.position.is_finite() {
            return Err(PhysicsError::NonFinitePosition {
                position: desc.position,
            });
        }
        if desc.target.is_some_and(|t| !t.is_finite()) {
            warn!(requested = ?desc.target, "dropping non-finite target");
            desc.target = None;
        }

        let (shape, clamped) = Shape::from_desc(&desc.shape);
        if clamped {
            warn!(requested = ?desc.shape, "degenerate body geometry clamped");
        }
        let angle = if desc.angle.is_finite() { desc.angle } else { 0.0 };
        let collider_shape = shape.collider();
        let material = desc.material;

        let builder = if desc.is_static {
            RigidBodyBuilder::fixed()
        } else {
            let damping = material.damping(self.params.dt);
            RigidBodyBuilder::dynamic()
                .linear_damping(damping)
                .angular_damping(damping)
                .additional_mass_properties(collider_shape.mass_properties(material.effective_density()))
        };
        let rigid = builder
            .translation(to_na(desc.position))
            .rotation(angle)
            .can_sleep(false)
            .build();
        let collider = ColliderBuilder::new(collider_shape)
            .density(0.0)
            .friction(material.friction)
            .restitution(material.restitution)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution_combine_rule(CoefficientCombineRule::Max)
            .sensor(!desc.collides)
            .build();

        let handle = BodyHandle(self.rigid_bodies.insert(rigid));
        self.colliders
            .insert_with_parent(collider, handle.0, &mut self.rigid_bodies);
        self.query_pipeline.update(&self.colliders);

        let seq = self.spawn_seq;
        self.spawn_seq += 1;
        self.states.insert(handle, BodyState::from_desc(shape, desc, angle, seq));
        Ok(handle)
    }

    /// Remove a body and any drag on it, returning its payload. Walls
    /// cannot be removed.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<P> {
        if self.wall_side(handle).is_some() {
            warn!(?handle, "refusing to remove a wall");
            return None;
        }
        let state = self.states.remove(&handle)?;
        self.release_drags_on(handle);
        self.remove_rigid_body(handle.0);
        self.query_pipeline.update(&self.colliders);
        state.payload
    }

    fn remove_rigid_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Set or clear the point a body is drawn to.
    pub fn set_target(&mut self, handle: BodyHandle, target: Option<Vec2>) -> Result<(), PhysicsError> {
        if let Some(point) = target.filter(|t| !t.is_finite()) {
            return Err(PhysicsError::NonFinitePosition { position: point });
        }
        let state = self
            .states
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        state.target = target;
        Ok(())
    }

    /// Advance by a raw frame delta. The delta is clamped and drained in
    /// fixed ticks.
    pub fn step(&mut self, delta_ms: f32) -> StepReport {
        let substeps = self.clock.accumulate(delta_ms);
        let mut frozen = Vec::new();
        for _ in 0..substeps {
            self.substep(&mut frozen);
        }
        StepReport {
            substeps,
            alpha: self.clock.alpha(),
            frozen,
        }
    }

    fn substep(&mut self, frozen: &mut Vec<BodyHandle>) {
        self.apply_target_forces();
        self.freeze_non_finite(frozen);

        let gravity = to_na(self.gravity * (MS_PER_S * MS_PER_S));
        self.pipeline.step(
            &gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.freeze_non_finite(frozen);
    }

    /// Record last tick's pose and push undragged dynamic bodies toward
    /// their targets.
    fn apply_target_forces(&mut self) {
        let dragged: Vec<BodyHandle> = self.drags.values().map(|d| d.body).collect();
        for (handle, rigid) in self.rigid_bodies.iter_mut() {
            let handle = BodyHandle(handle);
            let Some(state) = self.states.get_mut(&handle) else {
                continue;
            };
            state.prev_position = from_na(rigid.translation());
            state.prev_angle = rigid.rotation().angle();
            if state.is_static || state.frozen || dragged.contains(&handle) {
                continue;
            }
            let force = self.forces.force(
                state.prev_position,
                state.target,
                state.mass,
                state.area,
                state.material.buoyancy,
                &mut self.rng,
            );
            let delta = force / state.mass * TICK_DURATION_MS;
            let linvel = *rigid.linvel() + to_na(delta * MS_PER_S);
            rigid.set_linvel(linvel, true);
        }
    }

    /// Freeze bodies whose state went non-finite, restoring their last good
    /// pose and taking them out of the simulation.
    fn freeze_non_finite(&mut self, frozen: &mut Vec<BodyHandle>) {
        let mut newly_frozen = Vec::new();
        for (handle, rigid) in self.rigid_bodies.iter_mut() {
            let handle = BodyHandle(handle);
            let Some(state) = self.states.get_mut(&handle) else {
                continue;
            };
            if state.is_static || state.frozen {
                continue;
            }
            let finite = rigid.translation().iter().all(|v| v.is_finite())
                && rigid.rotation().angle().is_finite()
                && rigid.linvel().iter().all(|v| v.is_finite())
                && rigid.angvel().is_finite();
            if finite {
                continue;
            }
            error!(
                ?handle,
                position = ?from_na(rigid.translation()),
                velocity = ?from_na(rigid.linvel()),
                "non-finite body state, freezing body"
            );
            state.frozen = true;
            rigid.set_position(Isometry::new(to_na(state.prev_position), state.prev_angle), false);
            rigid.set_linvel(vector![0.0, 0.0], false);
            rigid.set_angvel(0.0, false);
            rigid.set_enabled(false);
            newly_frozen.push(handle);
        }
        for handle in newly_frozen {
            self.release_drags_on(handle);
            frozen.push(handle);
        }
    }

    /// Top-most non-frozen body containing `point`. Later spawns are on top.
    pub fn find_body_at(&self, point: Vec2) -> Option<BodyHandle> {
        if !point.is_finite() {
            return None;
        }
        let mut best: Option<(u64, BodyHandle)> = None;
        self.query_pipeline.intersections_with_point(
            &self.rigid_bodies,
            &self.colliders,
            &point![point.x, point.y],
            QueryFilter::default(),
            |collider| {
                let hit = self
                    .colliders
                    .get(collider)
                    .and_then(|c| c.parent())
                    .map(BodyHandle)
                    .and_then(|handle| self.states.get(&handle).map(|state| (handle, state)));
                if let Some((handle, state)) = hit.filter(|(_, state)| !state.frozen) {
                    if best.is_none_or(|(seq, _)| state.spawn_seq > seq) {
                        best = Some((state.spawn_seq, handle));
                    }
                }
                true
            },
        );
        best.map(|(_, handle)| handle)
    }

    /// Attach a drag spring to `body` at world point `anchor`.
    pub fn add_drag(&mut self, body: BodyHandle, anchor: Vec2) -> Result<ConstraintHandle, PhysicsError> {
        if !anchor.is_finite() {
            return Err(PhysicsError::NonFinitePosition { position: anchor });
        }
        let target = self.body(body).ok_or(PhysicsError::UnknownBody(body))?;
        if target.is_static() {
            return Err(PhysicsError::StaticBody(body));
        }
        if target.is_frozen() {
            return Err(PhysicsError::FrozenBody(body));
        }
        let (position, angle) = (target.position(), target.angle());

        let pointer_body = self.rigid_bodies.insert(
            RigidBodyBuilder::kinematic_position_based()
                .translation(to_na(anchor))
                .build(),
        );
        let drag = DragConstraint::new(body, pointer_body, position, angle, anchor);
        let (stiffness, damping) = spring_coefficients(self.drag_stiffness, self.drag_damping, self.params.dt);
        let joint = SpringJointBuilder::new(0.0, stiffness, damping)
            .spring_model(MotorModel::AccelerationBased)
            .local_anchor1(point![0.0, 0.0])
            .local_anchor2(point![drag.local_anchor.x, drag.local_anchor.y])
            .build();
        let handle = ConstraintHandle(self.impulse_joints.insert(pointer_body, body.0, joint, true));
        self.drags.insert(handle, drag);
        Ok(handle)
    }

    /// Move the pointer end of a drag.
    pub fn update_drag(&mut self, constraint: ConstraintHandle, point: Vec2) -> Result<(), PhysicsError> {
        if !point.is_finite() {
            return Err(PhysicsError::NonFinitePosition { position: point });
        }
        let drag = self
            .drags
            .get_mut(&constraint)
            .ok_or(PhysicsError::UnknownConstraint(constraint))?;
        drag.pointer = point;
        if let Some(pointer) = self.rigid_bodies.get_mut(drag.pointer_body) {
            pointer.set_next_kinematic_translation(to_na(point));
        }
        Ok(())
    }

    /// Drop a drag. Returns false if it was already gone.
    pub fn remove_drag(&mut self, constraint: ConstraintHandle) -> bool {
        let Some(drag) = self.drags.remove(&constraint) else {
            return false;
        };
        // Removing the pointer body takes the spring with it.
        self.remove_rigid_body(drag.pointer_body);
        true
    }

    pub fn drag(&self, constraint: ConstraintHandle) -> Option<&DragConstraint> {
        self.drags.get(&constraint)
    }

    pub fn is_dragged(&self, body: BodyHandle) -> bool {
        self.drags.values().any(|drag| drag.body == body)
    }

    fn release_drags_on(&mut self, body: BodyHandle) {
        let attached: Vec<ConstraintHandle> = self
            .drags
            .iter()
            .filter(|(_, drag)| drag.body == body)
            .map(|(handle, _)| *handle)
            .collect();
        for handle in attached {
            self.remove_drag(handle);
        }
    }

    /// Read-only view of every body, interpolated by `alpha`.
    pub fn snapshots(&self, alpha: f32) -> Vec<BodySnapshot<P>> {
        self.bodies()
            .map(|(handle, body)| BodySnapshot::of(handle, body, alpha))
            .collect()
    }

    pub fn snapshot(&self, handle: BodyHandle, alpha: f32) -> Option<BodySnapshot<P>> {
        self.body(handle).map(|body| BodySnapshot::of(handle, body, alpha))
    }
}
