use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached, or a call timed out. Transient.
    #[error("Search backend unavailable: {0}")]
    Unavailable(String),

    /// The server-side scroll context timed out or was released.
    #[error("Scroll context '{scroll_id}' has expired")]
    CursorExpired { scroll_id: String },

    /// The backend reached the request but refused it outright.
    #[error("Request rejected by the backend: {0}")]
    Rejected(String),

    /// Response body could not be decoded.
    #[error("Failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend answered with something the client cannot interpret.
    #[error("Unexpected response from the backend: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return BackendError::Unavailable(err.to_string());
        }
        if err.is_decode() {
            return BackendError::InvalidResponse(err.to_string());
        }
        BackendError::Unavailable(err.to_string())
    }
}
