use thiserror::Error;

/// Errors surfaced by the repository host and registry collaborators.
///
/// `NotFound` is distinguished from the generic variants because several
/// pipeline stages treat a missing repository or file as an expected,
/// recoverable outcome rather than a fault.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl HostError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        HostError::Network(err.to_string())
    }
}
