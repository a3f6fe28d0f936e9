use crate::categories::{CategoryProvider, HttpCategories, StaticCategories};
use crate::db::SqliteStorage;
use crate::storage::{JsonFileStorage, KeyValueStorage};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub categories_url: Option<String>,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), backend: Backend::Json, categories_url: None, port: DEFAULT_PORT }
    }
}

/// Values given on the command line or through the environment; each one
/// set here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub categories_url: Option<String>,
}

pub fn default_data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("todo-board"),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self> {
        let data_dir = overrides.data_dir.clone().unwrap_or_else(default_data_dir);
        let mut config = Self::read_file(&data_dir.join(CONFIG_FILE))?.unwrap_or_default();
        config.data_dir = data_dir;
        if let Some(backend) = overrides.backend {
            config.backend = backend;
        }
        if let Some(url) = overrides.categories_url {
            config.categories_url = Some(url);
        }
        config.categories_url = config.categories_url.filter(|u| !u.trim().is_empty());
        log::debug!("effective config: {:?}", config);
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        let storage: Arc<dyn KeyValueStorage> = match self.backend {
            Backend::Json => Arc::new(JsonFileStorage::new(self.data_dir.clone())?),
            Backend::Sqlite => Arc::new(SqliteStorage::new(self.data_dir.clone())?),
        };
        log::debug!("using {:?} storage in {}", self.backend, self.data_dir.display());
        Ok(storage)
    }

    pub fn category_provider(&self) -> Arc<dyn CategoryProvider> {
        match &self.categories_url {
            Some(url) => Arc::new(HttpCategories::new(url)),
            None => Arc::new(StaticCategories::default()),
        }
    }
}
