use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskError>;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("required field `{field}` is empty")]
    Validation { field: &'static str },

    #[error("category `{0}` is not one of the available categories")]
    UnknownCategory(String),

    #[error("failed to read `{key}` from storage: {reason}")]
    StorageRead { key: String, reason: String },

    #[error("failed to write `{key}` to storage: {reason}")]
    StorageWrite { key: String, reason: String },

    #[error("stored `{key}` record is unreadable: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("failed to fetch categories: {0}")]
    RemoteFetch(String),
}

impl TaskError {
    pub fn storage_read(key: &str, reason: impl ToString) -> Self {
        TaskError::StorageRead { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn storage_write(key: &str, reason: impl ToString) -> Self {
        TaskError::StorageWrite { key: key.to_string(), reason: reason.to_string() }
    }

    pub fn corrupt(key: &str, reason: impl ToString) -> Self {
        TaskError::Corrupt { key: key.to_string(), reason: reason.to_string() }
    }

    /// Short text suitable for showing to the person using the app.
    pub fn user_message(&self) -> &'static str {
        match self {
            TaskError::Validation { .. } => "Please fill in all fields.",
            TaskError::UnknownCategory(_) => "Please pick one of the listed categories.",
            TaskError::StorageRead { .. } | TaskError::Corrupt { .. } => "Failed to load saved tasks.",
            TaskError::StorageWrite { .. } => "Failed to save the task.",
            TaskError::RemoteFetch(_) => "Failed to load categories.",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TaskError::Validation { .. } | TaskError::UnknownCategory(_))
    }
}
