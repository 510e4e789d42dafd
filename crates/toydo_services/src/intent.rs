//! User intents emitted by the canvas toward the task store.

use serde::{Deserialize, Serialize};
use toydo_core::task::TaskId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum TaskIntent {
    ToggleComplete {
        id: TaskId,
    },
    Delete {
        id: TaskId,
    },
    /// Replace the content. `emoji: None` keeps the current emoji.
    Edit {
        id: TaskId,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emoji: Option<String>,
    },
    /// New order of every task id in the store.
    Reorder {
        order: Vec<TaskId>,
    },
}

impl TaskIntent {
    /// The single task this intent targets, if any.
    pub fn target(&self) -> Option<&TaskId> {
        match self {
            TaskIntent::ToggleComplete { id }
            | TaskIntent::Delete { id }
            | TaskIntent::Edit { id, .. } => Some(id),
            TaskIntent::Reorder { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_are_tagged() {
        let json = serde_json::to_string(&TaskIntent::ToggleComplete { id: TaskId::new("4") }).unwrap();
        assert_eq!(json, r#"{"intent":"toggle_complete","id":"4"}"#);

        let edit: TaskIntent =
            serde_json::from_str(r#"{"intent":"edit","id":"4","content":"jog"}"#).unwrap();
        assert_eq!(
            edit,
            TaskIntent::Edit {
                id: TaskId::new("4"),
                content: "jog".to_string(),
                emoji: None,
            }
        );
    }

    #[test]
    fn reorder_has_no_single_target() {
        let reorder = TaskIntent::Reorder { order: vec![TaskId::new("1")] };
        assert!(reorder.target().is_none());
        assert_eq!(TaskIntent::Delete { id: TaskId::new("1") }.target(), Some(&TaskId::new("1")));
    }
}
