use crate::{backend::SearchBackend, error::BackendError, page::ScrollPage};
use async_trait::async_trait;
use model::{
    bulk::{BulkReport, DocFailure, FailureKind},
    document::DocumentHit,
    ops::WriteOp,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

const SCROLL_ID: &str = "mem-scroll-0";

#[derive(Default)]
struct Inner {
    hits: Vec<DocumentHit>,
    advertised_total: u64,
    page_size: usize,
    served: usize,
    scroll_open: bool,
    fetches: u64,
    fail_fetch_after: Option<u64>,
    expire_scroll_after: Option<u64>,
    conflicts: HashMap<String, u32>,
    reject_ids: HashSet<String>,
    bulk_calls: Vec<Vec<WriteOp>>,
    applied: Vec<WriteOp>,
    scroll_opens: u64,
    scroll_closes: u64,
}

/// Deterministic in-memory stand-in for the search backend.
///
/// Seeded with a fixed hit sequence, it serves scroll pages in order,
/// records every bulk call, and can script failures: a page fetch that
/// starts failing, a scroll that expires mid-run, per-document version
/// conflicts that heal after a number of attempts, and hard rejections.
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn with_hits(hits: Vec<DocumentHit>) -> Self {
        let advertised_total = hits.len() as u64;
        MemoryBackend {
            inner: Mutex::new(Inner {
                hits,
                advertised_total,
                ..Inner::default()
            }),
        }
    }

    /// Override the total the backend advertises on the first response.
    /// Lets tests advertise more hits than the backend will ever serve.
    pub fn advertising_total(mut self, total: u64) -> Self {
        self.inner.get_mut().advertised_total = total;
        self
    }

    /// Page fetches beyond `n` (the opening fetch counts) fail as
    /// `Unavailable`.
    pub fn fail_fetch_after(mut self, n: u64) -> Self {
        self.inner.get_mut().fail_fetch_after = Some(n);
        self
    }

    /// Page fetches beyond `n` fail as `CursorExpired`.
    pub fn expire_scroll_after(mut self, n: u64) -> Self {
        self.inner.get_mut().expire_scroll_after = Some(n);
        self
    }

    /// The document fails with a version conflict for its first `times`
    /// bulk submissions, then heals.
    pub fn conflict_on(mut self, id: &str, times: u32) -> Self {
        self.inner.get_mut().conflicts.insert(id.to_string(), times);
        self
    }

    /// The document is rejected on every bulk submission.
    pub fn reject_on(mut self, id: &str) -> Self {
        self.inner.get_mut().reject_ids.insert(id.to_string());
        self
    }

    pub async fn bulk_calls(&self) -> Vec<Vec<WriteOp>> {
        self.inner.lock().await.bulk_calls.clone()
    }

    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.inner
            .lock()
            .await
            .bulk_calls
            .iter()
            .map(Vec::len)
            .collect()
    }

    pub async fn applied_ops(&self) -> Vec<WriteOp> {
        self.inner.lock().await.applied.clone()
    }

    pub async fn scroll_opens(&self) -> u64 {
        self.inner.lock().await.scroll_opens
    }

    pub async fn scroll_closes(&self) -> u64 {
        self.inner.lock().await.scroll_closes
    }

    fn serve_page(inner: &mut Inner) -> Result<ScrollPage, BackendError> {
        inner.fetches += 1;
        if let Some(limit) = inner.expire_scroll_after
            && inner.fetches > limit
        {
            inner.scroll_open = false;
            return Err(BackendError::CursorExpired {
                scroll_id: SCROLL_ID.to_string(),
            });
        }
        if let Some(limit) = inner.fail_fetch_after
            && inner.fetches > limit
        {
            return Err(BackendError::Unavailable("scripted failure".to_string()));
        }

        let end = (inner.served + inner.page_size).min(inner.hits.len());
        let hits = inner.hits[inner.served..end].to_vec();
        inner.served = end;
        let exhausted = hits.is_empty() || inner.served >= inner.hits.len();

        Ok(ScrollPage {
            hits,
            scroll_id: Some(SCROLL_ID.to_string()),
            total_hits: inner.advertised_total,
            exhausted,
        })
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn open_scroll(
        &self,
        _index: &str,
        _query: &Value,
        page_size: usize,
        _keep_alive: Duration,
    ) -> Result<ScrollPage, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.scroll_opens += 1;
        inner.scroll_open = true;
        inner.page_size = page_size;
        inner.served = 0;
        Self::serve_page(&mut inner)
    }

    async fn fetch_scroll_page(
        &self,
        scroll_id: &str,
        _keep_alive: Duration,
    ) -> Result<ScrollPage, BackendError> {
        let mut inner = self.inner.lock().await;
        if !inner.scroll_open || scroll_id != SCROLL_ID {
            return Err(BackendError::CursorExpired {
                scroll_id: scroll_id.to_string(),
            });
        }
        Self::serve_page(&mut inner)
    }

    async fn close_scroll(&self, _scroll_id: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        inner.scroll_open = false;
        inner.scroll_closes += 1;
        Ok(())
    }

    async fn execute_bulk(&self, ops: &[WriteOp]) -> Result<BulkReport, BackendError> {
        let mut inner = self.inner.lock().await;
        inner.bulk_calls.push(ops.to_vec());

        let mut failures = Vec::new();
        for op in ops {
            let id = op.doc_id().to_string();
            if inner.reject_ids.contains(&id) {
                failures.push(DocFailure {
                    index: op.index().to_string(),
                    id,
                    kind: FailureKind::Rejected,
                    reason: "scripted rejection".to_string(),
                });
                continue;
            }
            if let Some(remaining) = inner.conflicts.get_mut(&id)
                && *remaining > 0
            {
                *remaining -= 1;
                failures.push(DocFailure {
                    index: op.index().to_string(),
                    id,
                    kind: FailureKind::VersionConflict,
                    reason: "scripted version conflict".to_string(),
                });
                continue;
            }
            inner.applied.push(op.clone());
        }

        Ok(BulkReport { took_ms: 1, failures })
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hits(n: usize) -> Vec<DocumentHit> {
        (0..n)
            .map(|i| DocumentHit::new("metadata", &format!("doc-{i}"), json!({"n": i})))
            .collect()
    }

    #[tokio::test]
    async fn serves_pages_in_order_until_exhausted() {
        let backend = MemoryBackend::with_hits(hits(5));
        let keep = Duration::from_secs(60);

        let first = backend
            .open_scroll("metadata", &json!({"match_all": {}}), 2, keep)
            .await
            .unwrap();
        assert_eq!(first.total_hits, 5);
        assert_eq!(first.hit_count(), 2);
        assert!(!first.exhausted);

        let second = backend.fetch_scroll_page(SCROLL_ID, keep).await.unwrap();
        assert_eq!(second.hits[0].id, "doc-2");

        let third = backend.fetch_scroll_page(SCROLL_ID, keep).await.unwrap();
        assert_eq!(third.hit_count(), 1);
        assert!(third.exhausted);
    }

    #[tokio::test]
    async fn closed_scroll_is_expired() {
        let backend = MemoryBackend::with_hits(hits(3));
        let keep = Duration::from_secs(60);
        backend
            .open_scroll("metadata", &json!({"match_all": {}}), 2, keep)
            .await
            .unwrap();
        backend.close_scroll(SCROLL_ID).await.unwrap();

        let err = backend.fetch_scroll_page(SCROLL_ID, keep).await.unwrap_err();
        assert!(matches!(err, BackendError::CursorExpired { .. }));
    }

    #[tokio::test]
    async fn conflicts_heal_after_configured_attempts() {
        let backend = MemoryBackend::with_hits(hits(1)).conflict_on("doc-0", 1);
        let op = WriteOp::Delete {
            index: "metadata".into(),
            id: "doc-0".into(),
        };

        let report = backend.execute_bulk(std::slice::from_ref(&op)).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::VersionConflict);

        let report = backend.execute_bulk(std::slice::from_ref(&op)).await.unwrap();
        assert!(!report.has_failures());
        assert_eq!(backend.applied_ops().await.len(), 1);
        assert_eq!(backend.batch_sizes().await, vec![1, 1]);
    }
}
