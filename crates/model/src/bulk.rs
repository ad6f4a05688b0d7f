use serde::{Deserialize, Serialize};

/// Why a single document inside a bulk call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Concurrent modification detected by the backend; retryable a
    /// bounded number of times.
    VersionConflict,

    /// Any other per-document rejection (mapping error, missing document,
    /// malformed source). Not retryable.
    Rejected,
}

/// One failed document out of a bulk call that itself succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocFailure {
    pub index: String,
    pub id: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl DocFailure {
    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::VersionConflict
    }
}

/// Outcome of one bulk-write call.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    pub took_ms: u64,
    pub failures: Vec<DocFailure>,
}

impl BulkReport {
    pub fn ok(took_ms: u64) -> Self {
        BulkReport {
            took_ms,
            failures: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
