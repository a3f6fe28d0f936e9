use serde::{Deserialize, Serialize};
use std::fmt;

pub type TaskId = i64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub deadline: String,
    pub category: String,
    pub status: TaskStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }

    pub fn is_completed(&self) -> bool {
        *self == TaskStatus::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Task {
    /// New tasks always start out pending.
    pub fn new(id: TaskId, name: &str, deadline: &str, category: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            deadline: deadline.to_string(),
            category: category.to_string(),
            status: TaskStatus::Pending,
        }
    }
}
