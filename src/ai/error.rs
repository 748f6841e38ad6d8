use thiserror::Error;

/// Failure talking to, or interpreting the answer of, the generative model.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("model request timed out")]
    Timeout,

    #[error("cannot connect to model provider: {0}")]
    ConnectionFailed(String),

    #[error("invalid or expired API key: {0}")]
    AuthFailed(String),

    #[error("model provider rate limit exceeded, please try again later")]
    RateLimited,

    #[error("model provider error: {0}")]
    ApiError(String),

    #[error("model returned no content")]
    EmptyResponse,

    #[error("model output does not match the report schema: {0}")]
    SchemaMismatch(String),

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AiError::Timeout
        } else if err.is_connect() {
            AiError::ConnectionFailed(err.to_string())
        } else {
            AiError::ApiError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(err: serde_json::Error) -> Self {
        AiError::SchemaMismatch(err.to_string())
    }
}

pub type AiResult<T> = Result<T, AiError>;
