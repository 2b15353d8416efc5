use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification callers use to pick a message or a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Validation,
    DuplicateName,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FsError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("an item named '{name}' already exists here")]
    DuplicateName { name: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::Validation(_) | FsError::InvalidMove(_) | FsError::Snapshot(_) => {
                ErrorKind::Validation
            }
            FsError::DuplicateName { .. } => ErrorKind::DuplicateName,
            FsError::NotFound(_) => ErrorKind::NotFound,
        }
    }

    pub(crate) fn duplicate(name: impl Into<String>) -> Self {
        FsError::DuplicateName { name: name.into() }
    }
}

// serde_json::Error is stringified so FsError stays Clone + Serialize
impl From<serde_json::Error> for FsError {
    fn from(e: serde_json::Error) -> Self {
        FsError::Snapshot(e.to_string())
    }
}

pub type FsResult<T> = Result<T, FsError>;
