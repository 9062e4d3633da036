//! Error types for the fetch, storage, and transport boundaries.

use pricehawk::PricehawkError;

#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database not configured")]
    NoDatabase,

    #[error(transparent)]
    Core(#[from] PricehawkError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// True for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_) | ServerError::Core(PricehawkError::InvalidInput(_))
                | ServerError::Core(PricehawkError::UnknownPlatform(_))
        )
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
