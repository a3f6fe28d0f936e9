//! Reload-after-every-operation checks for the task store, run against each
//! storage backend.

use std::sync::Arc;
use todo_board::db::SqliteStorage;
use todo_board::storage::{JsonFileStorage, KeyValueStorage, MemoryStorage};
use todo_board::store::{TASKS_KEY, UNREADABLE_KEY};
use todo_board::{TaskError, TaskFilter, TaskStatus, TaskStore};

enum Op {
    Add(&'static str, &'static str, &'static str),
    Toggle(usize),
    Delete(usize),
    ToggleMissing,
}

fn script() -> Vec<Op> {
    vec![
        Op::Add("Essay", "2024-05-01", "Academic"),
        Op::Add("Gym", "tonight", "Personal"),
        Op::Add("Quarterly report", "Friday", "Work"),
        Op::Toggle(0),
        Op::Add("Call mum", "Sunday", "Personal"),
        Op::Delete(1),
        Op::ToggleMissing,
        Op::Toggle(0),
        Op::Toggle(2),
        Op::Delete(0),
    ]
}

/// Runs the script, reloading a fresh store from the same storage after each step.
fn assert_reload_matches(storage: Arc<dyn KeyValueStorage>) {
    let mut store = TaskStore::new(storage.clone());
    store.load().unwrap();

    for op in script() {
        match op {
            Op::Add(name, deadline, category) => {
                store.add(name, deadline, category).unwrap();
            }
            Op::Toggle(i) => {
                let id = store.tasks()[i].id;
                store.toggle_status(id).unwrap();
            }
            Op::Delete(i) => {
                let id = store.tasks()[i].id;
                store.delete(id).unwrap();
            }
            Op::ToggleMissing => {
                store.toggle_status(0).unwrap();
            }
        }

        let mut reloaded = TaskStore::new(storage.clone());
        reloaded.load().unwrap();
        assert_eq!(reloaded.tasks(), store.tasks());
    }

    let names: Vec<&str> = store.tasks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Quarterly report", "Call mum"]);
    assert_eq!(store.tasks()[0].status, TaskStatus::Pending);
    assert_eq!(store.tasks()[1].status, TaskStatus::Completed);
}

#[test]
fn json_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    assert_reload_matches(Arc::new(JsonFileStorage::new(dir.path().to_path_buf()).unwrap()));
}

#[test]
fn sqlite_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    assert_reload_matches(Arc::new(SqliteStorage::new(dir.path().to_path_buf()).unwrap()));
}

#[test]
fn memory_round_trip() {
    assert_reload_matches(Arc::new(MemoryStorage::new()));
}

#[test]
fn stored_record_layout() {
    let storage = Arc::new(MemoryStorage::new());
    let mut store = TaskStore::new(storage.clone());
    store.add("Essay", "2024-05-01", "Academic").unwrap();

    let raw = storage.get_item(TASKS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value.as_array().unwrap()[0];
    assert!(record["id"].is_i64());
    assert_eq!(record["name"], "Essay");
    assert_eq!(record["deadline"], "2024-05-01");
    assert_eq!(record["category"], "Academic");
    assert_eq!(record["status"], "Pending");
}

#[test]
fn filter_on_store_contents() {
    let mut store = TaskStore::new(Arc::new(MemoryStorage::new()));
    store.add("Ship release", "Monday", "Work").unwrap();
    store.add("Dentist", "Tuesday", "Personal").unwrap();
    let first = store.tasks()[0].id;
    store.toggle_status(first).unwrap();

    let visible = TaskFilter::new("", "Work", "").apply(store.tasks());
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, first);
    assert_eq!(visible[0].status, TaskStatus::Completed);
}

#[test]
fn delete_missing_id_keeps_three_tasks() {
    let mut store = TaskStore::new(Arc::new(MemoryStorage::new()));
    for name in ["a", "b", "c"] {
        store.add(name, "soon", "Work").unwrap();
    }
    let before = store.tasks().to_vec();
    let after = store.delete(42).unwrap().to_vec();
    assert_eq!(after, before);
}

#[test]
fn unreadable_storage_starts_empty_and_recovers() {
    let storage = Arc::new(MemoryStorage::new());
    let mut store = TaskStore::new(storage.clone());
    store.add("kept", "later", "Work").unwrap();

    storage.fail_reads(true);
    let mut next_session = TaskStore::new(storage.clone());
    assert!(matches!(next_session.load(), Err(TaskError::StorageRead { .. })));
    assert!(next_session.tasks().is_empty());

    storage.fail_reads(false);
    assert_eq!(next_session.load().unwrap().len(), 1);
}

#[test]
fn unreadable_json_file_survives_the_next_add() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(JsonFileStorage::new(dir.path().to_path_buf()).unwrap());
    let original = r#"[{"id":1,"name":"Essay","deadline":"2024-05-01","category":"Academic","status":"Incomplete"}]"#;
    storage.set_item(TASKS_KEY, original).unwrap();

    let mut store = TaskStore::new(storage.clone());
    assert!(matches!(store.load(), Err(TaskError::Corrupt { .. })));
    store.add("Gym", "tonight", "Personal").unwrap();

    assert_eq!(storage.get_item(UNREADABLE_KEY).unwrap().as_deref(), Some(original));
    let mut reloaded = TaskStore::new(storage.clone());
    assert_eq!(reloaded.load().unwrap().len(), 1);
}
