use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BugLoadError {
    #[error("bug file not found or unreadable: {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bug file is not a valid bug list: {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bug file has duplicate id {id}: {path}")]
    DuplicateId { path: PathBuf, id: i64 },

    #[error("loading {path} timed out after {timeout_ms} ms")]
    TimedOut { path: PathBuf, timeout_ms: u64 },
}

impl BugLoadError {
    /// True for failures caused by the file's contents rather than its absence.
    pub fn is_decode(&self) -> bool {
        matches!(self, BugLoadError::Decode { .. } | BugLoadError::DuplicateId { .. })
    }
}

pub type BugLoadResult<T> = Result<T, BugLoadError>;
