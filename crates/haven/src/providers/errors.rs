use thiserror::Error;

/// Failures at the model boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Transport, authentication or server-side failure
    #[error("{0}")]
    Unavailable(String),

    /// The model answered, but the payload is not a well-formed assistant message
    #[error("{0}")]
    ResponseInvalid(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::ResponseInvalid(err.to_string())
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
