//! Pure diff between the bound entities and a task list.

use super::map::EntityMap;
use crate::task::{TaskId, TaskRecord};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// What a reconcile has to do. `keep` and `add` follow list order; `remove`
/// follows map order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub keep: Vec<TaskId>,
    pub add: Vec<TaskId>,
    pub remove: Vec<TaskId>,
    /// Records dropped for having no id.
    pub missing_ids: usize,
    /// Ids that appeared more than once; only the last occurrence counts.
    pub duplicates: Vec<TaskId>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Open tasks with usable ids, deduplicated (last occurrence wins), in list
/// order.
pub fn open_tasks(tasks: &[TaskRecord]) -> (Vec<&TaskRecord>, usize, Vec<TaskId>) {
    let mut last_seen: HashMap<&TaskId, usize> = HashMap::new();
    let mut missing_ids = 0;
    for (i, task) in tasks.iter().enumerate() {
        if task.id.is_missing() {
            missing_ids += 1;
            warn!(position = i, "skipping task without an id");
            continue;
        }
        last_seen.insert(&task.id, i);
    }

    let mut duplicates = Vec::new();
    let mut open = Vec::new();
    for (i, task) in tasks.iter().enumerate() {
        if task.id.is_missing() {
            continue;
        }
        if last_seen.get(&task.id) != Some(&i) {
            warn!(id = %task.id, position = i, "duplicate task id, keeping the last occurrence");
            duplicates.push(task.id.clone());
            continue;
        }
        if !task.completed {
            open.push(task);
        }
    }
    (open, missing_ids, duplicates)
}

pub fn plan(existing: &EntityMap, tasks: &[TaskRecord]) -> ReconcilePlan {
    let (open, missing_ids, duplicates) = open_tasks(tasks);
    let wanted: HashSet<&TaskId> = open.iter().map(|t| &t.id).collect();

    let mut keep = Vec::new();
    let mut add = Vec::new();
    for task in &open {
        if existing.contains(&task.id) {
            keep.push(task.id.clone());
        } else {
            add.push(task.id.clone());
        }
    }
    let remove = existing
        .ids()
        .filter(|id| !wanted.contains(id))
        .cloned()
        .collect();

    ReconcilePlan {
        keep,
        add,
        remove,
        missing_ids,
        duplicates,
    }
}
