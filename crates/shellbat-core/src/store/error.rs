use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to replace {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings path: {0:?}")]
    InvalidPath(PathBuf),
    #[error("Invalid value {value:?} for property {name}")]
    InvalidValue { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
