//! Task id → bound entity map.

use crate::math::Vec2;
use crate::physics::BodyHandle;
use crate::task::TaskId;
use std::collections::HashMap;

/// How a task is represented in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding {
    /// Block mode: a free rigid body.
    Body { handle: BodyHandle },
    /// Bubble mode: a marker body drawn to a fixed target.
    Point { target: Vec2, marker: BodyHandle },
}

impl Binding {
    /// The world body behind this binding.
    pub fn body(&self) -> BodyHandle {
        match *self {
            Binding::Body { handle } => handle,
            Binding::Point { marker, .. } => marker,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundEntity {
    pub id: TaskId,
    pub binding: Binding,
    /// Slot point this entity was placed at.
    pub slot: Vec2,
}

/// Dense entity storage with an id index. Removal swaps the last entry
/// into the hole and fixes its index.
#[derive(Debug, Clone, Default)]
pub struct EntityMap {
    entries: Vec<BoundEntity>,
    index: HashMap<TaskId, usize>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&BoundEntity> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Insert or replace the entity for `entity.id`, returning the old one.
    pub fn insert(&mut self, entity: BoundEntity) -> Option<BoundEntity> {
        match self.index.get(&entity.id) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i], entity)),
            None => {
                self.index.insert(entity.id.clone(), self.entries.len());
                self.entries.push(entity);
                None
            }
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<BoundEntity> {
        let i = self.index.remove(id)?;
        let removed = self.entries.swap_remove(i);
        if let Some(moved) = self.entries.get(i) {
            self.index.insert(moved.id.clone(), i);
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundEntity> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TaskId> {
        self.entries.iter().map(|e| &e.id)
    }

    /// The entity whose binding uses `body`.
    pub fn find_by_body(&self, body: BodyHandle) -> Option<&BoundEntity> {
        self.entries.iter().find(|e| e.binding.body() == body)
    }

    /// Slot points, sorted top-down.
    pub fn slots(&self) -> Vec<Vec2> {
        let mut slots: Vec<Vec2> = self.entries.iter().map(|e| e.slot).collect();
        crate::sampler::sort_top_down(&mut slots);
        slots
    }

    /// Remove every entity, yielding them.
    pub fn drain(&mut self) -> impl Iterator<Item = BoundEntity> + '_ {
        self.index.clear();
        self.entries.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, n: u32) -> BoundEntity {
        BoundEntity {
            id: TaskId::new(id),
            binding: Binding::Body {
                handle: BodyHandle::from_raw_parts(n, 0),
            },
            slot: Vec2::new(0.0, n as f32),
        }
    }

    #[test]
    fn remove_fixes_moved_index() {
        let mut map = EntityMap::new();
        map.insert(entity("a", 0));
        map.insert(entity("b", 1));
        map.insert(entity("c", 2));

        let removed = map.remove(&TaskId::new("a")).unwrap();
        assert_eq!(removed.id, TaskId::new("a"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&TaskId::new("c")).unwrap().binding.body(), BodyHandle::from_raw_parts(2, 0));
        assert_eq!(map.get(&TaskId::new("b")).unwrap().binding.body(), BodyHandle::from_raw_parts(1, 0));
        assert!(map.remove(&TaskId::new("a")).is_none());
    }

    #[test]
    fn insert_replaces_existing() {
        let mut map = EntityMap::new();
        map.insert(entity("a", 0));
        let old = map.insert(entity("a", 5)).unwrap();
        assert_eq!(old.binding.body(), BodyHandle::from_raw_parts(0, 0));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn drain_empties_index() {
        let mut map = EntityMap::new();
        map.insert(entity("a", 0));
        map.insert(entity("b", 1));
        assert_eq!(map.drain().count(), 2);
        assert!(map.is_empty());
        assert!(!map.contains(&TaskId::new("a")));
    }

    #[test]
    fn finds_entity_by_body() {
        let mut map = EntityMap::new();
        map.insert(entity("a", 3));
        assert_eq!(map.find_by_body(BodyHandle::from_raw_parts(3, 0)).map(|e| e.id.as_str()), Some("a"));
        assert!(map.find_by_body(BodyHandle::from_raw_parts(3, 1)).is_none());
    }
}
