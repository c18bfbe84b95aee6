use thiserror::Error;

use crate::types::RecordId;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("name already assigned: {0}")]
    NameTaken(String),

    #[error("subject already taken: {0}")]
    SubjectTaken(String),

    #[error("parent sequence not found: {0}")]
    ParentNotFound(RecordId),

    #[error("sequence not found: {0}")]
    SequenceNotFound(RecordId),

    #[error("step not found: {0}")]
    StepNotFound(RecordId),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SequenceError>;
