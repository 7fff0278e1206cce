// crates/allot-server/src/error.rs
// Standardized error types for Allot

use thiserror::Error;

/// Main error type for the Allot library
#[derive(Error, Debug)]
pub enum AllotError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("Unsupported LLM provider: {0}")]
    UnknownProvider(String),

    #[error("{0} not found")]
    NotFound(String),

    /// A live business rule rejected the write
    #[error("{0}")]
    Constraint(String),

    #[error("No available supervisors found.")]
    NoAvailableSupervisor,

    #[error("No suitable supervisors found for this project.")]
    NoSuitableSupervisor,

    #[error("The selected supervisor has reached their maximum student limit.")]
    SupervisorAtCapacity,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unknown error: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using AllotError
pub type Result<T> = std::result::Result<T, AllotError>;

impl AllotError {
    /// True for errors caused by caller input rather than infrastructure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AllotError::NotFound(_)
                | AllotError::Constraint(_)
                | AllotError::NoAvailableSupervisor
                | AllotError::NoSuitableSupervisor
                | AllotError::SupervisorAtCapacity
                | AllotError::InvalidInput(_)
                | AllotError::UnknownProvider(_)
        )
    }
}

impl From<String> for AllotError {
    fn from(s: String) -> Self {
        AllotError::Other(s)
    }
}

impl From<tokio::task::JoinError> for AllotError {
    fn from(err: tokio::task::JoinError) -> Self {
        AllotError::Other(err.to_string())
    }
}

impl From<AllotError> for String {
    fn from(err: AllotError) -> Self {
        err.to_string()
    }
}
