use crate::{auth::AuthError, retry::RetryError};
use connectors::error::BackendError;
use model::job::InvalidOptions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Backend call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Retry attempts exhausted: {0}")]
    RetriesExhausted(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl From<RetryError<BackendError>> for PipelineError {
    fn from(err: RetryError<BackendError>) -> Self {
        match err {
            RetryError::Fatal(e) => PipelineError::Backend(e),
            RetryError::AttemptsExceeded(e) => PipelineError::RetriesExhausted(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Authorization failed: {0}")]
    Forbidden(#[from] AuthError),

    #[error("Invalid job options: {0}")]
    InvalidOptions(#[from] InvalidOptions),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
