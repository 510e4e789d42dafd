//! Task records as seen by the canvas.
//!
//! The canvas only reads tasks; it never writes their fields. Anything
//! beyond `id` and `completed` is display data carried along for views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable task identifier. Opaque: never parsed or ordered numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id means the record is missing its identifier.
    pub fn is_missing(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub completed: bool,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl TaskRecord {
    pub fn new(id: impl Into<TaskId>, completed: bool) -> Self {
        Self {
            id: id.into(),
            completed,
            content: String::new(),
            emoji: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_id_is_missing() {
        assert!(TaskId::new("").is_missing());
        assert!(TaskId::new("  ").is_missing());
        assert!(!TaskId::new("7").is_missing());
    }

    #[test]
    fn record_deserializes_without_display_fields() {
        let record: TaskRecord = serde_json::from_str(r#"{ "id": "1", "completed": false }"#).unwrap();
        assert_eq!(record, TaskRecord::new("1", false));
    }
}
