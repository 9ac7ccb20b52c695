use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Stored document is corrupt: {0}")]
    StorageCorrupt(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Import rejected: {0}")]
    ImportValidation(String),

    #[error("Invalid path: '{0}'")]
    InvalidPath(String),

    #[error("Type mismatch at '{path}': expected {expected}")]
    TypeMismatch { path: String, expected: &'static str },

    #[error("Field '{0}' is read-only")]
    ReadOnlyField(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
