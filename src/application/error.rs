// Failure taxonomy for measurement-service calls
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request was superseded. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,

    #[error("could not reach measurement service: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("API error: {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("unexpected response from {endpoint}: {detail}")]
    Shape { endpoint: &'static str, detail: String },
}

impl FetchError {
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        FetchError::Transport(Box::new(err))
    }

    pub fn shape(endpoint: &'static str, detail: impl Into<String>) -> Self {
        FetchError::Shape {
            endpoint,
            detail: detail.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}
