use crate::{error::BackendError, page::ScrollPage};
use async_trait::async_trait;
use model::{bulk::BulkReport, ops::WriteOp};
use serde_json::Value;
use std::time::Duration;

/// Narrow interface to the search backend: the paginated-query/scroll
/// primitives used by the cursor, and the bulk-write endpoint used by
/// the pipeline.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Begin backend-side pagination for `query` against `index`.
    /// The first page of hits and the advertised total come back together.
    async fn open_scroll(
        &self,
        index: &str,
        query: &Value,
        page_size: usize,
        keep_alive: Duration,
    ) -> Result<ScrollPage, BackendError>;

    /// Fetch the next page for an open scroll context.
    async fn fetch_scroll_page(
        &self,
        scroll_id: &str,
        keep_alive: Duration,
    ) -> Result<ScrollPage, BackendError>;

    /// Release the server-side scroll context.
    async fn close_scroll(&self, scroll_id: &str) -> Result<(), BackendError>;

    /// Submit one bulk call bundling all `ops`. A successful call may
    /// still carry per-document failures in the report.
    async fn execute_bulk(&self, ops: &[WriteOp]) -> Result<BulkReport, BackendError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), BackendError>;
}
