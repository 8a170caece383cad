use serde::{Deserialize, Serialize};
use taskboard_shared::{Priority, TaskDto};

/// One persisted to-do record. Field order and names match the on-disk JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
}

impl Task {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            priority: Priority::Medium,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        TaskDto {
            id: task.id,
            text: task.text.clone(),
            completed: task.completed,
            priority: task.priority,
        }
    }
}

/// Text is kept as typed; only whitespace-only input is refused.
pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

pub fn position_of(tasks: &[Task], id: u64) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}

pub fn contains(tasks: &[Task], id: u64) -> bool {
    position_of(tasks, id).is_some()
}
