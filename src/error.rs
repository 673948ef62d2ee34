use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("authentication required")]
    AuthRequired,
}

impl ClientError {
    /// HTTP status of a remote failure, if this error came from the API.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
