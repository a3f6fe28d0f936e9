use crate::error::{Result, TaskError};
use crate::storage::KeyValueStorage;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn new(data_dir: PathBuf) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        let db_path = data_dir.join("todo-board.db");
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute("CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at INTEGER)", [])?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().map_err(|e| TaskError::storage_read(key, e))?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get::<_, String>(0))
            .optional()
            .map_err(|e| TaskError::storage_read(key, e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| TaskError::storage_write(key, e))?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, strftime('%s','now'))",
            params![key, value],
        )
        .map_err(|e| TaskError::storage_write(key, e))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| TaskError::storage_write(key, e))?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| TaskError::storage_write(key, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_or_replace_keeps_one_row_per_key() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.set_item("tasks", "[]").unwrap();
        storage.set_item("tasks", "[{\"id\":1}]").unwrap();
        assert_eq!(storage.get_item("tasks").unwrap().as_deref(), Some("[{\"id\":1}]"));

        let conn = storage.conn.lock().unwrap();
        let rows: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0)).unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert_eq!(storage.get_item("tasks").unwrap(), None);
        storage.remove_item("tasks").unwrap();
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = SqliteStorage::new(dir.path().to_path_buf()).unwrap();
            storage.set_item("theme", "\"Dark\"").unwrap();
        }
        let storage = SqliteStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("\"Dark\""));
    }
}
