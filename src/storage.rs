use crate::error::{Result, TaskError};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Durable text records addressed by a fixed key.
///
/// `set_item` replaces the whole value; backends never expose a half-written
/// record to a later `get_item`.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

pub struct JsonFileStorage {
    pub dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(|e| TaskError::storage_write(&dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| TaskError::storage_read(key, e))?;
        Ok(Some(content))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).map_err(|e| TaskError::storage_write(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| TaskError::storage_write(key, e))?;
        log::debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| TaskError::storage_write(key, e))?;
        }
        Ok(())
    }
}

/// In-process storage. Lives as long as the value; used for ephemeral
/// sessions and for exercising storage failures.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut items) = storage.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
        storage
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TaskError::storage_read(key, "simulated read failure"));
        }
        let items = self.items.lock().map_err(|e| TaskError::storage_read(key, e))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TaskError::storage_write(key, "simulated write failure"));
        }
        let mut items = self.items.lock().map_err(|e| TaskError::storage_write(key, e))?;
        items.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().map_err(|e| TaskError::storage_write(key, e))?;
        items.remove(key);
        Ok(())
    }
}
