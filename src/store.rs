use crate::error::{Result, TaskError};
use crate::storage::KeyValueStorage;
use crate::task::{Task, TaskId};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Storage key holding the serialized task list. Only `TaskStore` writes it.
pub const TASKS_KEY: &str = "tasks";

/// Where an unparseable `tasks` record is copied before it can be overwritten.
pub const UNREADABLE_KEY: &str = "tasks.unreadable";

/// Millisecond timestamps, bumped so that no two calls ever return the same id.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: TaskId,
}

impl IdGenerator {
    pub fn next(&mut self) -> Result<TaskId> {
        let after_last = self.last.checked_add(1).ok_or_else(|| TaskError::corrupt(TASKS_KEY, "task ids exhausted"))?;
        let id = chrono::Utc::now().timestamp_millis().max(after_last);
        self.last = id;
        Ok(id)
    }

    /// Ensures future ids sort after `id`.
    pub fn observe(&mut self, id: TaskId) {
        self.last = self.last.max(id);
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

/// The one authoritative task list for a session.
///
/// Every mutation is staged on a copy, written to storage as a whole, and
/// only then swapped in. A failed write therefore leaves the in-memory list
/// exactly as it was.
///
/// Writes are refused while a saved record exists that this session could
/// not read and could not set aside, so a failed load never erases it.
pub struct TaskStore {
    storage: Arc<dyn KeyValueStorage>,
    tasks: Vec<Task>,
    ids: IdGenerator,
    blocked: bool,
}

impl TaskStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage, tasks: Vec::new(), ids: IdGenerator::default(), blocked: false }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn counts(&self) -> TaskCounts {
        let completed = self.tasks.iter().filter(|t| t.status.is_completed()).count();
        TaskCounts { total: self.tasks.len(), pending: self.tasks.len() - completed, completed }
    }

    /// Replaces the in-memory list with the persisted one.
    ///
    /// On any failure the list is reset to empty and the error is returned
    /// as a diagnostic. An unparseable record is copied to `UNREADABLE_KEY`
    /// first; if that copy fails, or the record could not be read at all,
    /// mutations fail until a later `load` succeeds.
    pub fn load(&mut self) -> Result<&[Task]> {
        self.tasks.clear();
        let raw = match self.storage.get_item(TASKS_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("starting with an empty task list: {}", e);
                self.blocked = true;
                return Err(e);
            }
        };
        let Some(raw) = raw else {
            self.blocked = false;
            return Ok(&self.tasks);
        };
        match parse_tasks(&raw) {
            Ok(tasks) => {
                if let Some(max) = tasks.iter().map(|t| t.id).max() {
                    self.ids.observe(max);
                }
                log::debug!("loaded {} tasks", tasks.len());
                self.blocked = false;
                self.tasks = tasks;
                Ok(&self.tasks)
            }
            Err(e) => {
                log::warn!("starting with an empty task list: {}", e);
                self.blocked = match self.storage.set_item(UNREADABLE_KEY, &raw) {
                    Ok(()) => {
                        log::warn!("previous record kept under `{}`", UNREADABLE_KEY);
                        false
                    }
                    Err(backup) => {
                        log::error!("could not set the unreadable record aside: {}", backup);
                        true
                    }
                };
                Err(e)
            }
        }
    }

    pub fn add(&mut self, name: &str, deadline: &str, category: &str) -> Result<&[Task]> {
        let name = required("name", name)?;
        let deadline = required("deadline", deadline)?;
        let category = required("category", category)?;

        let task = Task::new(self.ids.next()?, name, deadline, category);
        log::info!("adding task {} ({})", task.id, task.name);
        let mut next = self.tasks.clone();
        next.push(task);
        self.commit(next)?;
        Ok(&self.tasks)
    }

    /// Flips Pending/Completed. An unknown id leaves the list as is.
    pub fn toggle_status(&mut self, id: TaskId) -> Result<&[Task]> {
        let mut next = self.tasks.clone();
        match next.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = task.status.toggled();
                log::info!("task {} is now {}", id, task.status);
            }
            None => log::debug!("toggle: no task with id {}", id),
        }
        self.commit(next)?;
        Ok(&self.tasks)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<&[Task]> {
        let mut next = self.tasks.clone();
        let before = next.len();
        next.retain(|t| t.id != id);
        if next.len() < before {
            log::info!("deleted task {}", id);
        } else {
            log::debug!("delete: no task with id {}", id);
        }
        self.commit(next)?;
        Ok(&self.tasks)
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        if self.blocked {
            log::error!("refusing to overwrite tasks that were never loaded");
            return Err(TaskError::storage_write(TASKS_KEY, "saved tasks were not loaded; reload first"));
        }
        let content = serde_json::to_string(&next).map_err(|e| TaskError::storage_write(TASKS_KEY, e))?;
        if let Err(e) = self.storage.set_item(TASKS_KEY, &content) {
            log::error!("keeping previous task list: {}", e);
            return Err(e);
        }
        self.tasks = next;
        Ok(())
    }
}

fn parse_tasks(content: &str) -> Result<Vec<Task>> {
    let tasks: Vec<Task> = serde_json::from_str(content).map_err(|e| TaskError::corrupt(TASKS_KEY, e))?;
    let mut seen = HashSet::new();
    if let Some(dup) = tasks.iter().find(|t| !seen.insert(t.id)) {
        return Err(TaskError::corrupt(TASKS_KEY, format!("duplicate task id {}", dup.id)));
    }
    Ok(tasks)
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TaskError::Validation { field });
    }
    Ok(value)
}
