//! Error types for the bazaar tracker

use thiserror::Error;

/// Bazaar tracker errors
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Feed request error: {0}")]
    Feed(String),

    #[error("Failed to parse feed payload: {0}")]
    Parse(String),

    #[error("Timed out waiting for tracker read access")]
    LockTimeout,

    #[error("Persistence sink error: {0}")]
    Persistence(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Feed(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
