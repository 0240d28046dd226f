use std::path::PathBuf;

use shared::{
    domain::LevelId,
    error::{ErrorCode, ErrorReport},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("level {0} does not exist in the catalog")]
    LevelNotFound(LevelId),
    #[error("session controller is no longer running")]
    ControllerClosed,
}

impl From<&SessionError> for ErrorReport {
    fn from(value: &SessionError) -> Self {
        let code = match value {
            SessionError::LevelNotFound(_) => ErrorCode::NotFound,
            SessionError::ControllerClosed => ErrorCode::Unavailable,
        };
        ErrorReport::new(code, value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog contains no levels")]
    Empty,
    #[error("level id {0} is out of range; ids start at 1 and must leave room for a successor")]
    InvalidLevelId(LevelId),
    #[error("level {0} is defined more than once")]
    DuplicateLevel(LevelId),
    #[error("level {0} has no items")]
    EmptyLevel(LevelId),
    #[error("failed to parse catalog document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
