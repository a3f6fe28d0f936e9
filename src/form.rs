use crate::categories::CategorySet;
use crate::error::Result;
use crate::store::TaskStore;
use crate::task::Task;
use serde::Deserialize;

/// Raw add-task input as typed by the user.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskForm {
    pub name: String,
    pub deadline: String,
    pub category: String,
}

impl TaskForm {
    pub fn new(name: &str, deadline: &str, category: &str) -> Self {
        Self { name: name.to_string(), deadline: deadline.to_string(), category: category.to_string() }
    }

    /// Checks the category against what is currently offered, then adds the
    /// task. Nothing is stored if any check fails.
    pub fn submit<'s>(&self, store: &'s mut TaskStore, categories: &CategorySet) -> Result<&'s [Task]> {
        let category = categories.validate(&self.category)?;
        store.add(&self.name, &self.deadline, category)
    }
}
