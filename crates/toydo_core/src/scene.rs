//! Scene: the physics world and entity binder behind one narrow API.
//!
//! Hosts feed task snapshots into [`Scene::sync`], advance time with
//! [`Scene::step`] and render [`Scene::views`]. The world itself is never
//! handed out mutably except to the interaction layer.

use crate::binder::{Binding, EntityBinder, ReconcileReport};
use crate::config::{LayoutMode, Tuning};
use crate::driver::Simulation;
use crate::math::{Bounds, Vec2};
use crate::physics::{PhysicsError, PhysicsWorld, Shape, StepReport, WallSide};
use crate::task::{TaskId, TaskRecord};
use tracing::info;

/// Identity of a rendered entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Task(TaskId),
    Wall(WallSide),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    /// A free block.
    Body,
    /// A static wall.
    Wall,
    /// A bubble marker and the slot it floats to.
    Point { target: Vec2 },
}

/// One entity as the view layer draws it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    pub key: EntityKey,
    pub kind: EntityKind,
    pub position: Vec2,
    pub angle: f32,
    /// Geometry in entity-local coordinates.
    pub outline: Shape,
}

#[derive(Debug, Clone)]
pub struct Scene {
    world: PhysicsWorld<TaskId>,
    binder: EntityBinder,
    tasks: Vec<TaskRecord>,
    last_step: StepReport,
}

impl Scene {
    pub fn new(bounds: Bounds, mode: LayoutMode, tuning: &Tuning) -> Result<Self, PhysicsError> {
        let mut world = PhysicsWorld::new(bounds, tuning)?;
        let binder = EntityBinder::new(bounds, mode, tuning);
        binder.apply_mode(&mut world);
        Ok(Self {
            world,
            binder,
            tasks: Vec::new(),
            last_step: StepReport::default(),
        })
    }

    pub fn mode(&self) -> LayoutMode {
        self.binder.mode()
    }

    pub fn bounds(&self) -> Bounds {
        self.world.bounds()
    }

    pub fn world(&self) -> &PhysicsWorld<TaskId> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld<TaskId> {
        &mut self.world
    }

    pub fn binder(&self) -> &EntityBinder {
        &self.binder
    }

    /// Tasks from the most recent sync.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn last_step(&self) -> &StepReport {
        &self.last_step
    }

    /// Take a new task snapshot and reconcile the world with it.
    pub fn sync(&mut self, tasks: &[TaskRecord]) -> Result<ReconcileReport, PhysicsError> {
        self.tasks = tasks.to_vec();
        self.binder.reconcile(&mut self.world, &self.tasks)
    }

    pub fn step(&mut self, delta_ms: f32) -> StepReport {
        let report = self.world.step(delta_ms);
        self.last_step = report.clone();
        report
    }

    /// Switch between bubbles and blocks. Every entity is rebuilt.
    pub fn set_mode(&mut self, mode: LayoutMode) -> Result<ReconcileReport, PhysicsError> {
        info!(?mode, "switching layout mode");
        self.binder.set_mode(&mut self.world, mode, &self.tasks)
    }

    /// Re-place every open task on fresh slots.
    pub fn refresh(&mut self) -> Result<ReconcileReport, PhysicsError> {
        self.binder.reshuffle(&mut self.world, &self.tasks)
    }

    /// Fit the scene to a new canvas size. Bubble slots are regenerated
    /// since old targets may lie off-canvas; blocks are pushed back in by
    /// the walls.
    pub fn resize(&mut self, bounds: Bounds) -> Result<(), PhysicsError> {
        self.world.resize(bounds)?;
        self.binder.set_bounds(bounds);
        if self.mode() == LayoutMode::Bubble {
            self.refresh()?;
        }
        Ok(())
    }

    /// Task rendered under `point`, if any.
    pub fn task_at(&self, point: Vec2) -> Option<&TaskId> {
        let body = self.world.find_body_at(point)?;
        self.binder.task_for_body(body)
    }

    /// Every entity, interpolated by the last step's alpha.
    pub fn views(&self) -> Vec<EntityView> {
        self.views_at(self.world.alpha())
    }

    pub fn views_at(&self, alpha: f32) -> Vec<EntityView> {
        let mut views = Vec::with_capacity(self.binder.map().len() + 4);

        for (side, handle) in self.world.walls() {
            if let Some(snapshot) = self.world.snapshot(handle, alpha) {
                views.push(EntityView {
                    key: EntityKey::Wall(side),
                    kind: EntityKind::Wall,
                    position: snapshot.position,
                    angle: snapshot.angle,
                    outline: snapshot.shape,
                });
            }
        }

        for entity in self.binder.map().iter() {
            let Some(snapshot) = self.world.snapshot(entity.binding.body(), alpha) else {
                continue;
            };
            let kind = match entity.binding {
                Binding::Body { .. } => EntityKind::Body,
                Binding::Point { target, .. } => EntityKind::Point { target },
            };
            views.push(EntityView {
                key: EntityKey::Task(entity.id.clone()),
                kind,
                position: snapshot.position,
                angle: snapshot.angle,
                outline: snapshot.shape,
            });
        }
        views
    }
}

impl Simulation for Scene {
    fn advance(&mut self, delta_ms: f32) -> StepReport {
        self.step(delta_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TICK_DURATION_MS;

    const BOUNDS: Bounds = Bounds::new(390.0, 844.0);

    fn scene(mode: LayoutMode) -> Scene {
        Scene::new(BOUNDS, mode, &Tuning::default()).unwrap()
    }

    fn task_views(scene: &Scene) -> Vec<EntityView> {
        scene
            .views()
            .into_iter()
            .filter(|v| matches!(v.key, EntityKey::Task(_)))
            .collect()
    }

    #[test]
    fn sync_binds_open_tasks_only() {
        let mut scene = scene(LayoutMode::Bubble);
        scene
            .sync(&[
                TaskRecord::new("1", false),
                TaskRecord::new("2", true),
                TaskRecord::new("3", false),
            ])
            .unwrap();

        let mut keys: Vec<EntityKey> = task_views(&scene).into_iter().map(|v| v.key).collect();
        keys.sort_by_key(|k| format!("{k:?}"));
        assert_eq!(
            keys,
            vec![EntityKey::Task(TaskId::new("1")), EntityKey::Task(TaskId::new("3"))]
        );
        assert_eq!(scene.views().len(), 6);
    }

    #[test]
    fn bubbles_float_to_their_slots() {
        let mut scene = scene(LayoutMode::Bubble);
        scene.sync(&[TaskRecord::new("a", false)]).unwrap();
        for _ in 0..900 {
            scene.step(TICK_DURATION_MS);
        }
        let view = &task_views(&scene)[0];
        let EntityKind::Point { target } = view.kind else {
            panic!("bubble mode renders points");
        };
        assert!(view.position.distance(target) <= Tuning::default().settle_distance + 1.0);
    }

    #[test]
    fn task_at_finds_the_body_under_the_pointer() {
        let mut scene = scene(LayoutMode::Block);
        scene.sync(&[TaskRecord::new("a", false)]).unwrap();
        let slot = scene.binder().entity(&TaskId::new("a")).unwrap().slot;
        assert_eq!(scene.task_at(slot), Some(&TaskId::new("a")));
        assert_eq!(scene.task_at(Vec2::new(-500.0, -500.0)), None);
    }

    #[test]
    fn mode_switch_keeps_task_set() {
        let mut scene = scene(LayoutMode::Bubble);
        scene.sync(&[TaskRecord::new("a", false), TaskRecord::new("b", false)]).unwrap();
        scene.set_mode(LayoutMode::Block).unwrap();
        let views = task_views(&scene);
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.kind == EntityKind::Body));
    }

    #[test]
    fn resize_replaces_bubble_slots_inside_new_bounds() {
        let mut scene = scene(LayoutMode::Bubble);
        scene.sync(&[TaskRecord::new("a", false), TaskRecord::new("b", false)]).unwrap();
        let rotated = Bounds::new(844.0, 390.0);
        scene.resize(rotated).unwrap();

        let margin = Tuning::default().margin();
        for entity in scene.binder().map().iter() {
            assert!(rotated.shrink(margin).contains(entity.slot));
        }
        assert_eq!(scene.bounds(), rotated);
        assert!(scene.resize(Bounds::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn refresh_keeps_the_same_tasks() {
        let mut scene = scene(LayoutMode::Bubble);
        scene.sync(&[TaskRecord::new("a", false)]).unwrap();
        let report = scene.refresh().unwrap();
        assert_eq!(report.added, vec![TaskId::new("a")]);
        assert_eq!(task_views(&scene).len(), 1);
    }
}
