use connectors::error::BackendError;
use engine::error::JobError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the job file: {0}")]
    JobFileRead(#[from] std::io::Error),

    #[error("Failed to parse the job file: {0}")]
    JobFileParse(#[from] serde_json::Error),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Job failed: {0}")]
    Job(#[from] JobError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
