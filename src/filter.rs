use crate::task::Task;
use serde::Deserialize;

/// Search and filter criteria for the task list. Empty strings mean "all".
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TaskFilter {
    pub search: String,
    pub category: String,
    pub status: String,
}

impl TaskFilter {
    pub fn new(search: &str, category: &str, status: &str) -> Self {
        Self { search: search.to_string(), category: category.to_string(), status: status.to_string() }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.category.is_empty() && self.status.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        let name_ok = self.search.is_empty() || task.name.to_lowercase().contains(&self.search.to_lowercase());
        let category_ok = self.category.is_empty() || task.category == self.category;
        let status_ok = self.status.is_empty() || task.status.as_str() == self.status;
        name_ok && category_ok && status_ok
    }

    /// The visible subset of `tasks`, in their original order.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}
