use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Item parsing error: {0}")]
    ItemParse(String),

    #[error("Corrupt feed store at {path}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Feed already exists: {0}")]
    DuplicateFeed(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// Errors that should be retried on the next cycle rather than surfaced.
    pub fn is_transient(&self) -> bool {
        matches!(self, RelayError::Http(_) | RelayError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
