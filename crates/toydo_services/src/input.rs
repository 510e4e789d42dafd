//! Pointer input on the canvas.
//!
//! Each pointer runs `idle → pressed → dragging → released`. A press on a
//! block attaches a drag spring that follows the pointer until release;
//! short, still presses become taps.

use std::collections::HashMap;
use toydo_core::config::Tuning;
use toydo_core::math::Vec2;
use toydo_core::physics::{BodyHandle, ConstraintHandle};
use toydo_core::scene::Scene;
use toydo_core::task::TaskId;
use tracing::{debug, warn};

pub type PointerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// The system took the gesture away.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub kind: PointerKind,
    pub position: Vec2,
    pub time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Idle,
    Pressed,
    Dragging,
}

/// Result of a finished pointer interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Tap { task: TaskId },
    DragEnd { task: TaskId, displacement: Vec2 },
    Cancelled,
}

impl Gesture {
    /// Task whose detail view a tap opens.
    pub fn detail_target(&self) -> Option<&TaskId> {
        match self {
            Gesture::Tap { task } => Some(task),
            Gesture::DragEnd { .. } | Gesture::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Press {
    start_ms: f64,
    start: Vec2,
    body: Option<BodyHandle>,
    task: Option<TaskId>,
    drag: Option<ConstraintHandle>,
    dragging: bool,
}

#[derive(Debug, Clone)]
pub struct InteractionLayer {
    tap_max_duration_ms: f64,
    tap_max_distance: f32,
    pointers: HashMap<PointerId, Press>,
}

impl InteractionLayer {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tap_max_duration_ms: tuning.tap_max_duration_ms as f64,
            tap_max_distance: tuning.tap_max_distance,
            pointers: HashMap::new(),
        }
    }

    pub fn phase(&self, pointer: PointerId) -> PointerPhase {
        match self.pointers.get(&pointer) {
            None => PointerPhase::Idle,
            Some(press) if press.dragging => PointerPhase::Dragging,
            Some(_) => PointerPhase::Pressed,
        }
    }

    /// Drag spring held by `pointer`, if any.
    pub fn drag_of(&self, pointer: PointerId) -> Option<ConstraintHandle> {
        self.pointers.get(&pointer).and_then(|p| p.drag)
    }

    /// Pointers currently down.
    pub fn active(&self) -> usize {
        self.pointers.len()
    }

    pub fn handle(&mut self, scene: &mut Scene, event: PointerEvent) -> Option<Gesture> {
        match event.kind {
            PointerKind::Down => self.press(scene, event.pointer, event.position, event.time_ms),
            PointerKind::Move => {
                self.move_to(scene, event.pointer, event.position);
                None
            }
            PointerKind::Up => self.release(scene, event.pointer, event.position, event.time_ms),
            PointerKind::Cancel => self.cancel(scene, event.pointer),
        }
    }

    /// Start a press. A pointer that is already down is cancelled first and
    /// that cancellation is returned.
    pub fn press(&mut self, scene: &mut Scene, pointer: PointerId, position: Vec2, time_ms: f64) -> Option<Gesture> {
        let previous = self.cancel(scene, pointer);

        let body = scene.world().find_body_at(position);
        let task = body.and_then(|b| scene.binder().task_for_body(b)).cloned();
        let draggable = scene.mode().is_draggable()
            && task.is_some()
            && body.is_some_and(|b| scene.world().body(b).is_some_and(|body| !body.is_static()));

        let drag = match body {
            Some(b) if draggable => match scene.world_mut().add_drag(b, position) {
                Ok(constraint) => Some(constraint),
                Err(error) => {
                    warn!(%error, "could not attach drag");
                    None
                }
            },
            _ => None,
        };
        debug!(pointer, ?task, dragging = drag.is_some(), "pointer down");

        self.pointers.insert(
            pointer,
            Press {
                start_ms: time_ms,
                start: position,
                body,
                task,
                drag,
                dragging: false,
            },
        );
        previous
    }

    /// Follow the pointer. Returns the phase after the move.
    pub fn move_to(&mut self, scene: &mut Scene, pointer: PointerId, position: Vec2) -> PointerPhase {
        let tap_max_distance = self.tap_max_distance;
        let Some(press) = self.pointers.get_mut(&pointer) else {
            return PointerPhase::Idle;
        };
        if position.distance(press.start) >= tap_max_distance {
            press.dragging = true;
        }
        if let Some(constraint) = press.drag {
            if let Err(error) = scene.world_mut().update_drag(constraint, position) {
                // Body removed by a reconcile while held.
                debug!(%error, pointer, "drag lost");
                press.drag = None;
            }
        }
        self.phase(pointer)
    }

    /// End a press, classifying it as a tap or the end of a drag. Presses
    /// that hit no task yield nothing.
    pub fn release(&mut self, scene: &mut Scene, pointer: PointerId, position: Vec2, time_ms: f64) -> Option<Gesture> {
        let press = self.pointers.remove(&pointer)?;
        if let Some(constraint) = press.drag {
            scene.world_mut().remove_drag(constraint);
        }

        let elapsed = time_ms - press.start_ms;
        let displacement = position - press.start;
        let task = press.task?;
        if press.body.is_some_and(|b| !scene.world().contains(b)) {
            debug!(%task, "released over a removed body");
            return None;
        }

        if elapsed < self.tap_max_duration_ms && displacement.length() < self.tap_max_distance {
            Some(Gesture::Tap { task })
        } else {
            Some(Gesture::DragEnd { task, displacement })
        }
    }

    pub fn cancel(&mut self, scene: &mut Scene, pointer: PointerId) -> Option<Gesture> {
        let press = self.pointers.remove(&pointer)?;
        if let Some(constraint) = press.drag {
            scene.world_mut().remove_drag(constraint);
        }
        Some(Gesture::Cancelled)
    }

    /// Cancel every pointer, e.g. when the canvas goes away.
    pub fn cancel_all(&mut self, scene: &mut Scene) {
        let pointers: Vec<PointerId> = self.pointers.keys().copied().collect();
        for pointer in pointers {
            self.cancel(scene, pointer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toydo_core::config::LayoutMode;
    use toydo_core::math::Bounds;
    use toydo_core::task::TaskRecord;

    fn scene(mode: LayoutMode) -> Scene {
        let mut scene = Scene::new(Bounds::new(390.0, 844.0), mode, &Tuning::default()).unwrap();
        scene.sync(&[TaskRecord::new("a", false)]).unwrap();
        scene
    }

    fn body_position(scene: &Scene) -> Vec2 {
        let entity = scene.binder().entity(&TaskId::new("a")).unwrap();
        scene.world().body(entity.binding.body()).unwrap().position()
    }

    #[test]
    fn short_still_press_is_a_tap() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);

        assert!(input.press(&mut scene, 1, at, 0.0).is_none());
        assert_eq!(input.phase(1), PointerPhase::Pressed);
        let gesture = input.release(&mut scene, 1, at + Vec2::new(2.0, 0.0), 100.0);
        assert_eq!(gesture, Some(Gesture::Tap { task: TaskId::new("a") }));
        assert_eq!(gesture.unwrap().detail_target(), Some(&TaskId::new("a")));
        assert_eq!(input.phase(1), PointerPhase::Idle);
    }

    #[test]
    fn long_moving_press_is_a_drag() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);

        input.press(&mut scene, 1, at, 0.0);
        let constraint = input.drag_of(1).unwrap();
        assert_eq!(input.move_to(&mut scene, 1, at + Vec2::new(50.0, 0.0)), PointerPhase::Dragging);
        assert_eq!(scene.world().drag(constraint).unwrap().pointer(), at + Vec2::new(50.0, 0.0));

        let gesture = input.release(&mut scene, 1, at + Vec2::new(50.0, 0.0), 500.0).unwrap();
        assert_eq!(
            gesture,
            Gesture::DragEnd {
                task: TaskId::new("a"),
                displacement: Vec2::new(50.0, 0.0),
            }
        );
        assert!(gesture.detail_target().is_none());
        assert!(scene.world().drag(constraint).is_none());
    }

    #[test]
    fn slow_press_in_place_is_not_a_tap() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);
        input.press(&mut scene, 1, at, 0.0);
        let gesture = input.release(&mut scene, 1, at, 400.0);
        assert!(matches!(gesture, Some(Gesture::DragEnd { .. })));
    }

    #[test]
    fn bubbles_can_be_tapped_but_not_dragged() {
        let mut scene = scene(LayoutMode::Bubble);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);

        input.press(&mut scene, 7, at, 0.0);
        assert!(input.drag_of(7).is_none());
        let gesture = input.release(&mut scene, 7, at, 50.0);
        assert_eq!(gesture, Some(Gesture::Tap { task: TaskId::new("a") }));
    }

    #[test]
    fn empty_canvas_yields_nothing() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let far = body_position(&scene) + Vec2::new(0.0, 10_000.0);
        input.press(&mut scene, 1, far, 0.0);
        assert!(input.release(&mut scene, 1, far, 50.0).is_none());
    }

    #[test]
    fn second_press_cancels_the_first() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);

        input.press(&mut scene, 1, at, 0.0);
        let first = input.drag_of(1).unwrap();
        assert_eq!(input.press(&mut scene, 1, at, 10.0), Some(Gesture::Cancelled));
        assert!(scene.world().drag(first).is_none());
        assert!(input.drag_of(1).is_some());
        assert_eq!(input.active(), 1);
    }

    #[test]
    fn cancel_releases_the_drag() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);

        let down = PointerEvent {
            pointer: 3,
            kind: PointerKind::Down,
            position: at,
            time_ms: 0.0,
        };
        input.handle(&mut scene, down);
        let constraint = input.drag_of(3).unwrap();
        let gesture = input.handle(
            &mut scene,
            PointerEvent {
                kind: PointerKind::Cancel,
                ..down
            },
        );
        assert_eq!(gesture, Some(Gesture::Cancelled));
        assert!(scene.world().drag(constraint).is_none());
        assert!(input.cancel(&mut scene, 3).is_none());
    }

    #[test]
    fn cancel_all_releases_every_pointer() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);
        input.press(&mut scene, 1, at, 0.0);
        input.press(&mut scene, 2, at + Vec2::new(500.0, 0.0), 0.0);
        assert_eq!(input.active(), 2);

        input.cancel_all(&mut scene);
        assert_eq!(input.active(), 0);
        let body = scene.binder().entity(&TaskId::new("a")).unwrap().binding.body();
        assert!(!scene.world().is_dragged(body));
    }

    #[test]
    fn removed_body_ends_without_a_gesture() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);

        input.press(&mut scene, 1, at, 0.0);
        scene.sync(&[TaskRecord::new("a", true)]).unwrap();
        assert_eq!(input.move_to(&mut scene, 1, at + Vec2::new(30.0, 0.0)), PointerPhase::Dragging);
        assert!(input.drag_of(1).is_none());
        assert!(input.release(&mut scene, 1, at, 500.0).is_none());
    }

    #[test]
    fn dragged_block_follows_the_pointer() {
        let mut scene = scene(LayoutMode::Block);
        let mut input = InteractionLayer::new(&Tuning::default());
        let at = body_position(&scene);
        let goal = Vec2::new(195.0, 300.0);

        input.press(&mut scene, 1, at, 0.0);
        input.move_to(&mut scene, 1, goal);
        for _ in 0..300 {
            scene.step(toydo_core::time::TICK_DURATION_MS);
        }
        assert!(body_position(&scene).distance(goal) < 60.0);
    }
}
