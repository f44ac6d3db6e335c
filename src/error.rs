use thiserror::Error;

use crate::model::UserId;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure talking to the users API. `Display` is the description shown to the user.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("network worker is not running")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Initial load or refresh failed; the dataset is untouched.
    #[error("failed to fetch users: {0}")]
    FetchFailed(String),

    /// Create, update or delete failed; the dataset is untouched.
    #[error("{action} failed: {message}")]
    MutationFailed {
        action: &'static str,
        message: String,
    },

    /// Form input rejected before any remote call.
    #[error("invalid input: {0}")]
    ValidationFailed(#[from] validator::ValidationErrors),

    /// Another operation is still in flight.
    #[error("busy: {0}")]
    Busy(&'static str),

    #[error("no user with id {0}")]
    NotFound(UserId),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl Error {
    pub fn mutation(action: &'static str, err: impl std::fmt::Display) -> Self {
        Error::MutationFailed {
            action,
            message: err.to_string(),
        }
    }
}
