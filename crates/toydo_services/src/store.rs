//! In-memory task collection.
//!
//! Every successful mutation bumps [`TaskStore::revision`], so a host can
//! compare revisions to decide when to hand a fresh snapshot to the scene.

use crate::intent::TaskIntent;
use std::collections::HashSet;
use thiserror::Error;
use toydo_core::task::{TaskId, TaskRecord};
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no task with id {0}")]
    UnknownTask(TaskId),

    #[error("task id {0} is already in use")]
    DuplicateId(TaskId),

    #[error("task ids must not be empty")]
    MissingId,

    #[error("reorder must list every task exactly once ({expected} tasks, got {actual} ids)")]
    ReorderMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<TaskRecord>,
    revision: u64,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `tasks`. Rejects blank or repeated ids.
    pub fn from_tasks(tasks: Vec<TaskRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if task.id.is_missing() {
                return Err(StoreError::MissingId);
            }
            if !seen.insert(&task.id) {
                return Err(StoreError::DuplicateId(task.id.clone()));
            }
        }
        Ok(Self {
            tasks,
            revision: 0,
            next_id: 0,
        })
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    fn position(&self, id: &TaskId) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::UnknownTask(id.clone()))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn fresh_id(&mut self) -> TaskId {
        loop {
            self.next_id += 1;
            let id = TaskId::new(format!("task-{}", self.next_id));
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Add an open task at the top of the list and return its id.
    pub fn add(&mut self, content: impl Into<String>, emoji: Option<String>) -> TaskId {
        let id = self.fresh_id();
        let mut record = TaskRecord::new(id.clone(), false).with_content(content);
        record.emoji = emoji;
        self.tasks.insert(0, record);
        self.bump();
        debug!(%id, "task added");
        id
    }

    pub fn remove(&mut self, id: &TaskId) -> Result<TaskRecord, StoreError> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        self.bump();
        Ok(removed)
    }

    /// Flip completion and return the new state.
    pub fn toggle(&mut self, id: &TaskId) -> Result<bool, StoreError> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        let completed = task.completed;
        self.bump();
        Ok(completed)
    }

    /// Replace content. `emoji: None` keeps the current emoji.
    pub fn edit(&mut self, id: &TaskId, content: impl Into<String>, emoji: Option<String>) -> Result<(), StoreError> {
        let index = self.position(id)?;
        let task = &mut self.tasks[index];
        task.content = content.into();
        if emoji.is_some() {
            task.emoji = emoji;
        }
        self.bump();
        Ok(())
    }

    /// Swap with the previous task. Returns false at the top.
    pub fn move_up(&mut self, id: &TaskId) -> Result<bool, StoreError> {
        let index = self.position(id)?;
        if index == 0 {
            return Ok(false);
        }
        self.tasks.swap(index, index - 1);
        self.bump();
        Ok(true)
    }

    /// Swap with the next task. Returns false at the bottom.
    pub fn move_down(&mut self, id: &TaskId) -> Result<bool, StoreError> {
        let index = self.position(id)?;
        if index + 1 >= self.tasks.len() {
            return Ok(false);
        }
        self.tasks.swap(index, index + 1);
        self.bump();
        Ok(true)
    }

    /// Put the tasks in `order`, which must be a permutation of the ids.
    pub fn reorder(&mut self, order: &[TaskId]) -> Result<(), StoreError> {
        let mismatch = StoreError::ReorderMismatch {
            expected: self.tasks.len(),
            actual: order.len(),
        };
        if order.len() != self.tasks.len() {
            return Err(mismatch);
        }
        let mut reordered = Vec::with_capacity(order.len());
        let mut seen = HashSet::new();
        for id in order {
            if !seen.insert(id) {
                return Err(mismatch);
            }
            let index = self.position(id)?;
            reordered.push(self.tasks[index].clone());
        }
        self.tasks = reordered;
        self.bump();
        Ok(())
    }

    pub fn apply(&mut self, intent: &TaskIntent) -> Result<(), StoreError> {
        debug!(?intent, "applying intent");
        match intent {
            TaskIntent::ToggleComplete { id } => self.toggle(id).map(|_| ()),
            TaskIntent::Delete { id } => self.remove(id).map(|_| ()),
            TaskIntent::Edit { id, content, emoji } => self.edit(id, content.clone(), emoji.clone()),
            TaskIntent::Reorder { order } => self.reorder(order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TaskStore {
        TaskStore::from_tasks(vec![
            TaskRecord::new("1", false).with_content("plan"),
            TaskRecord::new("2", true).with_content("milk"),
            TaskRecord::new("3", false).with_content("jog"),
        ])
        .unwrap()
    }

    fn ids(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn add_prepends_with_unique_id() {
        let mut store = store();
        let a = store.add("read", Some("📚".to_string()));
        let b = store.add("write", None);
        assert_ne!(a, b);
        assert_eq!(store.tasks()[0].id, b);
        assert_eq!(store.get(&a).unwrap().emoji.as_deref(), Some("📚"));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn toggle_flips_and_bumps_revision() {
        let mut store = store();
        assert!(store.toggle(&TaskId::new("1")).unwrap());
        assert!(!store.toggle(&TaskId::new("1")).unwrap());
        assert_eq!(store.revision(), 2);
        assert_eq!(
            store.toggle(&TaskId::new("9")),
            Err(StoreError::UnknownTask(TaskId::new("9")))
        );
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn edit_keeps_emoji_when_absent() {
        let mut store = TaskStore::from_tasks(vec![TaskRecord::new("1", false).with_emoji("💻")]).unwrap();
        store.edit(&TaskId::new("1"), "rewrite", None).unwrap();
        let task = store.get(&TaskId::new("1")).unwrap();
        assert_eq!(task.content, "rewrite");
        assert_eq!(task.emoji.as_deref(), Some("💻"));
    }

    #[test]
    fn move_up_and_down_stop_at_the_ends() {
        let mut store = store();
        assert!(!store.move_up(&TaskId::new("1")).unwrap());
        assert!(store.move_down(&TaskId::new("1")).unwrap());
        assert_eq!(ids(&store), ["2", "1", "3"]);
        assert!(!store.move_down(&TaskId::new("3")).unwrap());
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let mut store = store();
        let order: Vec<TaskId> = ["3", "1", "2"].into_iter().map(TaskId::from).collect();
        store.reorder(&order).unwrap();
        assert_eq!(ids(&store), ["3", "1", "2"]);

        let short = vec![TaskId::new("3")];
        assert!(matches!(store.reorder(&short), Err(StoreError::ReorderMismatch { .. })));
        let repeated: Vec<TaskId> = ["3", "3", "1"].into_iter().map(TaskId::from).collect();
        assert!(matches!(store.reorder(&repeated), Err(StoreError::ReorderMismatch { .. })));
        assert_eq!(ids(&store), ["3", "1", "2"]);
    }

    #[test]
    fn apply_routes_intents() {
        let mut store = store();
        store.apply(&TaskIntent::Delete { id: TaskId::new("2") }).unwrap();
        store.apply(&TaskIntent::ToggleComplete { id: TaskId::new("3") }).unwrap();
        assert_eq!(ids(&store), ["1", "3"]);
        assert!(store.get(&TaskId::new("3")).unwrap().completed);
    }

    #[test]
    fn seeding_rejects_bad_ids() {
        assert_eq!(
            TaskStore::from_tasks(vec![TaskRecord::new("", false)]).unwrap_err(),
            StoreError::MissingId
        );
        assert_eq!(
            TaskStore::from_tasks(vec![TaskRecord::new("a", false), TaskRecord::new("a", true)]).unwrap_err(),
            StoreError::DuplicateId(TaskId::new("a"))
        );
    }
}
