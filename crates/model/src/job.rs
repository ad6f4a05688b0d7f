use crate::bulk::DocFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STATUS_UPDATED: &str = "updated";

#[derive(Debug, Error)]
pub enum InvalidOptions {
    #[error("docs_per_request must be greater than zero")]
    ZeroDocsPerRequest,

    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("job label must not be empty")]
    EmptyLabel,
}

/// Configuration of one bulk job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    /// Human-readable label used in progress messages.
    pub label: String,

    /// Number of write operations per bulk call.
    pub docs_per_request: usize,

    /// Number of hits requested per scroll page.
    pub page_size: usize,

    /// Upper bound on records pulled from the cursor; 0 means unbounded.
    pub max_docs: u64,

    /// Per-document retries on a version conflict.
    pub retry_on_conflict: u32,

    /// Requires the admin role if true.
    pub admin_only: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        JobOptions {
            label: "bulk job".to_string(),
            docs_per_request: 1000,
            page_size: 1000,
            max_docs: 0,
            retry_on_conflict: 1,
            admin_only: true,
        }
    }
}

impl JobOptions {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn validated(self) -> Result<Self, InvalidOptions> {
        if self.docs_per_request == 0 {
            return Err(InvalidOptions::ZeroDocsPerRequest);
        }
        if self.page_size == 0 {
            return Err(InvalidOptions::ZeroPageSize);
        }
        if self.label.trim().is_empty() {
            return Err(InvalidOptions::EmptyLabel);
        }
        Ok(self)
    }
}

/// Returned to the caller after a successful run.
///
/// `count` is the number of records seen by the cursor, not the number of
/// writes that succeeded; per-document failures that survived conflict
/// retries are listed in `failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReceipt {
    pub count: u64,
    pub status: String,
    pub failed: Vec<DocFailure>,
    pub completed_at: DateTime<Utc>,
}

impl JobReceipt {
    pub fn updated(count: u64, failed: Vec<DocFailure>) -> Self {
        JobReceipt {
            count,
            status: STATUS_UPDATED.to_string(),
            failed,
            completed_at: Utc::now(),
        }
    }
}
