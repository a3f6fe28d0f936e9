pub mod categories;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod form;
pub mod server;
pub mod storage;
pub mod store;
pub mod task;
pub mod theme;

pub use error::{Result, TaskError};
pub use filter::TaskFilter;
pub use store::TaskStore;
pub use task::{Task, TaskId, TaskStatus};
pub use theme::{ThemeMode, ThemeStore};
