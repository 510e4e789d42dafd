//! Binds open tasks to bodies in the physics world.
//!
//! Reconciliation is incremental: an id present before and after keeps its
//! body, slot and motion untouched. Only added ids get new slots (kept clear
//! of everything already placed) and only removed or completed ids lose
//! their bodies.

mod map;
mod plan;

pub use map::{Binding, BoundEntity, EntityMap};
pub use plan::{open_tasks, plan, ReconcilePlan};

use crate::config::{LayoutMode, Tuning};
use crate::math::{seeded_rng, Bounds, SimRng, Vec2};
use crate::physics::{BodyDesc, BodyHandle, Material, PhysicsError, PhysicsWorld, ShapeDesc};
use crate::sampler::SpatialSampler;
use crate::task::{TaskId, TaskRecord};
use rand::Rng;
use tracing::debug;

/// Keeps binder block shapes apart from the sampler's sequence.
const SHAPE_SEED_SALT: u64 = 0x5eed_b10c;

/// Outcome of a reconcile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<TaskId>,
    pub removed: Vec<TaskId>,
    pub kept: usize,
    /// Open tasks with no room on the canvas. Retried on the next reconcile.
    pub unplaced: Vec<TaskId>,
    /// Most slots the canvas holds at the configured spacing.
    pub capacity: usize,
    pub missing_ids: usize,
    pub duplicates: Vec<TaskId>,
}

/// Random block geometry around a nominal radius: circles, near-square or
/// long rectangles, and regular polygons, some with rounded corners.
pub fn block_shape(rng: &mut SimRng, radius: f32) -> ShapeDesc {
    // Shapes are sized on a 75-unit reference and scaled to `radius`.
    let scale = radius / 75.0;
    let sides: u32 = rng.random_range(1..=8);
    let chamfer = if sides > 2 && rng.random_bool(0.3) { 10.0 * scale } else { 0.0 };

    if rng.random_bool(0.5) {
        if rng.random_bool(0.8) {
            ShapeDesc::Rect {
                width: rng.random_range(50.0..100.0) * scale,
                height: rng.random_range(50.0..100.0) * scale,
                chamfer,
            }
        } else {
            ShapeDesc::Rect {
                width: rng.random_range(160.0..240.0) * scale,
                height: rng.random_range(50.0..60.0) * scale,
                chamfer,
            }
        }
    } else {
        let radius = rng.random_range(50.0..100.0) * scale * 0.5;
        if sides < 3 {
            ShapeDesc::Circle { radius }
        } else {
            ShapeDesc::Polygon { sides, radius, chamfer }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityBinder {
    mode: LayoutMode,
    tuning: Tuning,
    sampler: SpatialSampler,
    map: EntityMap,
    unplaced: Vec<TaskId>,
    shape_rng: SimRng,
}

impl EntityBinder {
    pub fn new(bounds: Bounds, mode: LayoutMode, tuning: &Tuning) -> Self {
        Self {
            mode,
            tuning: tuning.clone(),
            sampler: SpatialSampler::new(bounds, tuning.margin(), tuning.seed),
            map: EntityMap::new(),
            unplaced: Vec::new(),
            shape_rng: seeded_rng(tuning.seed ^ SHAPE_SEED_SALT),
        }
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn map(&self) -> &EntityMap {
        &self.map
    }

    pub fn entity(&self, id: &TaskId) -> Option<&BoundEntity> {
        self.map.get(id)
    }

    /// Ids the last reconcile could not place.
    pub fn unplaced(&self) -> &[TaskId] {
        &self.unplaced
    }

    pub fn task_for_body(&self, body: BodyHandle) -> Option<&TaskId> {
        self.map.find_by_body(body).map(|e| &e.id)
    }

    /// Most items the canvas can hold at the configured spacing.
    pub fn capacity(&mut self) -> usize {
        self.sampler.max_capacity(self.tuning.min_item_distance)
    }

    /// Gravity for the current mode: blocks fall, bubbles float.
    pub fn apply_mode(&self, world: &mut PhysicsWorld<TaskId>) {
        let gravity = match self.mode {
            LayoutMode::Block => Vec2::new(0.0, self.tuning.block_gravity),
            LayoutMode::Bubble => Vec2::ZERO,
        };
        world.set_gravity(gravity);
    }

    /// Bring the world in line with `tasks`.
    pub fn reconcile(
        &mut self,
        world: &mut PhysicsWorld<TaskId>,
        tasks: &[TaskRecord],
    ) -> Result<ReconcileReport, PhysicsError> {
        let plan = plan(&self.map, tasks);

        for id in &plan.remove {
            if let Some(entity) = self.map.remove(id) {
                world.remove(entity.binding.body());
            }
        }

        let occupied: Vec<Vec2> = match self.mode {
            LayoutMode::Bubble => self.map.iter().map(|e| e.slot).collect(),
            LayoutMode::Block => self
                .map
                .iter()
                .filter_map(|e| world.body(e.binding.body()).map(|b| b.position()))
                .collect(),
        };
        let points = self
            .sampler
            .extend(&occupied, plan.add.len(), self.tuning.min_item_distance);

        let bounds = world.bounds();
        let mut added = Vec::new();
        let mut unplaced = Vec::new();
        for (i, id) in plan.add.iter().enumerate() {
            match points.get(i) {
                Some(&slot) => {
                    let binding = self.spawn(world, id, slot, bounds)?;
                    self.map.insert(BoundEntity {
                        id: id.clone(),
                        binding,
                        slot,
                    });
                    added.push(id.clone());
                }
                None => unplaced.push(id.clone()),
            }
        }
        self.unplaced = unplaced.clone();
        let capacity = self.capacity();

        debug!(
            added = added.len(),
            removed = plan.remove.len(),
            kept = plan.keep.len(),
            unplaced = unplaced.len(),
            capacity,
            "reconciled tasks"
        );
        Ok(ReconcileReport {
            added,
            removed: plan.remove,
            kept: plan.keep.len(),
            unplaced,
            capacity,
            missing_ids: plan.missing_ids,
            duplicates: plan.duplicates,
        })
    }

    fn spawn(
        &mut self,
        world: &mut PhysicsWorld<TaskId>,
        id: &TaskId,
        slot: Vec2,
        bounds: Bounds,
    ) -> Result<Binding, PhysicsError> {
        match self.mode {
            LayoutMode::Bubble => {
                // Markers start one canvas height below and rise into place.
                let desc = BodyDesc::circle(self.tuning.bubble_radius)
                    .with_material(Material::BUBBLE.with_buoyancy(self.tuning.buoyancy))
                    .sensor()
                    .at(slot + Vec2::new(0.0, bounds.height))
                    .with_target(slot)
                    .with_payload(id.clone());
                let marker = world.spawn(desc)?;
                Ok(Binding::Point { target: slot, marker })
            }
            LayoutMode::Block => {
                let shape = block_shape(&mut self.shape_rng, self.tuning.block_radius);
                let desc = BodyDesc::new(shape)
                    .with_material(Material::BLOCK)
                    .at(slot)
                    .with_payload(id.clone());
                let handle = world.spawn(desc)?;
                Ok(Binding::Body { handle })
            }
        }
    }

    /// Release every entity's body.
    pub fn clear(&mut self, world: &mut PhysicsWorld<TaskId>) {
        for entity in self.map.drain() {
            world.remove(entity.binding.body());
        }
        self.unplaced.clear();
    }

    /// Throw away every slot and place all open tasks again.
    pub fn reshuffle(
        &mut self,
        world: &mut PhysicsWorld<TaskId>,
        tasks: &[TaskRecord],
    ) -> Result<ReconcileReport, PhysicsError> {
        self.clear(world);
        self.reconcile(world, tasks)
    }

    /// Switch presentation and rebuild every entity for it.
    pub fn set_mode(
        &mut self,
        world: &mut PhysicsWorld<TaskId>,
        mode: LayoutMode,
        tasks: &[TaskRecord],
    ) -> Result<ReconcileReport, PhysicsError> {
        self.mode = mode;
        self.apply_mode(world);
        self.reshuffle(world, tasks)
    }

    /// New canvas size for future slots. Placed entities keep theirs.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.sampler.set_bounds(bounds);
    }
}
