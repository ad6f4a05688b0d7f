use crate::{
    batch::BulkBuffer,
    error::PipelineError,
    metrics::RunMetrics,
    progress::{ProgressReport, ProgressTracker},
    retry::{RetryPolicy, classify_backend_error},
    scroll::Scroller,
    transform::HitTransform,
};
use connectors::backend::SearchBackend;
use model::{
    bulk::{BulkReport, DocFailure},
    ops::WriteOp,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What one pipeline run produced.
///
/// `docs_seen` counts records pulled from the cursor; `ops_written`
/// counts operations the backend accepted. They diverge when transforms
/// fail or per-document writes stay failed after conflict retries.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub docs_seen: u64,
    pub ops_written: u64,
    pub transform_failures: u64,
    pub failed: Vec<DocFailure>,
    pub reports: Vec<ProgressReport>,
}

/// Drives one scroll→transform→accumulate→flush run.
///
/// Exactly one batch is in flight at a time: a flush is synchronous with
/// respect to the scroll loop, which bounds memory and keeps operations
/// in backend order.
pub struct BulkPipeline {
    backend: Arc<dyn SearchBackend>,
    retry: RetryPolicy,
    retry_on_conflict: u32,
    metrics: RunMetrics,
    cancel: CancellationToken,
}

impl BulkPipeline {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        retry: RetryPolicy,
        retry_on_conflict: u32,
        cancel: CancellationToken,
    ) -> Self {
        BulkPipeline {
            backend,
            retry,
            retry_on_conflict,
            metrics: RunMetrics::new(),
            cancel,
        }
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub async fn run(
        &self,
        scroller: &mut Scroller,
        transform: &dyn HitTransform,
        batch_capacity: usize,
        tracker: &ProgressTracker,
    ) -> Result<PipelineOutcome, PipelineError> {
        let total = scroller.effective_total();
        let mut buffer = BulkBuffer::new(batch_capacity);
        let mut outcome = PipelineOutcome::default();

        loop {
            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let Some(hit) = scroller.next().await? else {
                break;
            };
            outcome.docs_seen += 1;
            self.metrics.incr_docs_seen(1);

            match transform.apply(&hit) {
                Ok(Some(op)) => {
                    buffer.push(op);
                    self.metrics.incr_ops_queued(1);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(doc_id = %hit.id, error = %err, "Transform failed; skipping document");
                    outcome.transform_failures += 1;
                    self.metrics.incr_transform_failures(1);
                }
            }

            let is_last = outcome.docs_seen >= total;
            if buffer.is_full() || is_last {
                self.flush(&mut buffer, &mut outcome, tracker, total, is_last)
                    .await?;
            }
            if is_last {
                break;
            }
        }

        // The backend can end the scroll short of the advertised total;
        // flush whatever is pending and make sure a final report goes out.
        if !outcome.reports.last().is_some_and(|r| r.finished) {
            self.flush(&mut buffer, &mut outcome, tracker, total, true)
                .await?;
        }

        Ok(outcome)
    }

    /// One bulk call for everything pending, then a progress report.
    /// The buffer is cleared as a unit, never partially.
    async fn flush(
        &self,
        buffer: &mut BulkBuffer,
        outcome: &mut PipelineOutcome,
        tracker: &ProgressTracker,
        total: u64,
        is_final: bool,
    ) -> Result<(), PipelineError> {
        let ops = buffer.take();
        if !ops.is_empty() {
            let report = self.execute_bulk(&ops).await?;
            self.metrics.incr_batches_flushed(1);

            let unresolved = self.settle_failures(&ops, report).await?;
            outcome.ops_written += (ops.len() - unresolved.len()) as u64;
            self.metrics.incr_write_failures(unresolved.len() as u64);
            outcome.failed.extend(unresolved);
        }

        let progress = tracker.report(outcome.docs_seen, total, is_final);
        debug!("{progress}");
        outcome.reports.push(progress);
        Ok(())
    }

    async fn execute_bulk(&self, ops: &[WriteOp]) -> Result<BulkReport, PipelineError> {
        let backend = self.backend.clone();
        let report = self
            .retry
            .run(
                || {
                    let backend = backend.clone();
                    let ops = ops.to_vec();
                    async move { backend.execute_bulk(&ops).await }
                },
                classify_backend_error,
            )
            .await?;
        Ok(report)
    }

    /// Per-document failures out of a successful bulk call: version
    /// conflicts get individual re-submissions up to `retry_on_conflict`;
    /// whatever remains is handed back for the job receipt.
    async fn settle_failures(
        &self,
        ops: &[WriteOp],
        report: BulkReport,
    ) -> Result<Vec<DocFailure>, PipelineError> {
        let mut unresolved = Vec::new();

        for failure in report.failures {
            if !failure.is_retryable() || self.retry_on_conflict == 0 {
                unresolved.push(failure);
                continue;
            }
            let Some(op) = ops.iter().find(|op| op.doc_id() == failure.id) else {
                unresolved.push(failure);
                continue;
            };
            unresolved.extend(self.retry_conflicted(op, failure).await?);
        }

        Ok(unresolved)
    }

    async fn retry_conflicted(
        &self,
        op: &WriteOp,
        mut last: DocFailure,
    ) -> Result<Option<DocFailure>, PipelineError> {
        for _ in 0..self.retry_on_conflict {
            self.metrics.incr_conflict_retries(1);
            let report = self.execute_bulk(std::slice::from_ref(op)).await?;
            match report.failures.into_iter().next() {
                None => return Ok(None),
                Some(failure) => {
                    let retryable = failure.is_retryable();
                    last = failure;
                    if !retryable {
                        break;
                    }
                }
            }
        }
        warn!(doc_id = %last.id, reason = %last.reason, "Document write stayed failed");
        Ok(Some(last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::ScrollConfig;
    use crate::transform::DeleteMatching;
    use connectors::memory::MemoryBackend;
    use model::document::DocumentHit;
    use serde_json::json;

    fn hits(n: usize) -> Vec<DocumentHit> {
        (0..n)
            .map(|i| DocumentHit::new("metadata", &format!("doc-{i}"), json!({"n": i})))
            .collect()
    }

    async fn open(
        backend: &Arc<MemoryBackend>,
        page_size: usize,
        max_docs: u64,
    ) -> Scroller {
        let config = ScrollConfig::new("metadata", json!({"match_all": {}}))
            .with_page_size(page_size)
            .with_max_docs(max_docs);
        let backend: Arc<dyn SearchBackend> = backend.clone();
        Scroller::open(backend, config, RetryPolicy::none())
            .await
            .unwrap()
    }

    fn pipeline(backend: &Arc<MemoryBackend>, retry_on_conflict: u32) -> BulkPipeline {
        BulkPipeline::new(
            backend.clone(),
            RetryPolicy::none(),
            retry_on_conflict,
            CancellationToken::new(),
        )
    }

    /// A transform that fails for configured document ids.
    struct FailingOn(Vec<String>);

    impl HitTransform for FailingOn {
        fn apply(
            &self,
            hit: &DocumentHit,
        ) -> Result<Option<WriteOp>, crate::transform::TransformError> {
            if self.0.contains(&hit.id) {
                return Err(crate::transform::TransformError::Failed {
                    id: hit.id.clone(),
                    reason: "scripted".to_string(),
                });
            }
            DeleteMatching.apply(hit)
        }
    }

    #[tokio::test]
    async fn splits_2500_docs_into_three_flushes() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(2500)));
        let mut scroller = open(&backend, 1000, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 1000, &tracker)
            .await
            .unwrap();

        assert_eq!(outcome.docs_seen, 2500);
        assert_eq!(outcome.ops_written, 2500);
        assert_eq!(backend.batch_sizes().await, vec![1000, 1000, 500]);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn cap_truncates_the_run() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(2500)));
        let mut scroller = open(&backend, 1000, 1200).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 1000, &tracker)
            .await
            .unwrap();

        assert_eq!(outcome.docs_seen, 1200);
        assert_eq!(backend.batch_sizes().await, vec![1000, 200]);
    }

    #[tokio::test]
    async fn exact_multiple_of_capacity_flushes_last_batch_once() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(2000)));
        let mut scroller = open(&backend, 500, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 1000, &tracker)
            .await
            .unwrap();

        assert_eq!(backend.batch_sizes().await, vec![1000, 1000]);
        assert_eq!(outcome.reports.len(), 2);
        assert!(outcome.reports[1].finished);
    }

    #[tokio::test]
    async fn no_batch_exceeds_capacity() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(23)));
        let mut scroller = open(&backend, 5, 0).await;
        let tracker = ProgressTracker::new("reindex");

        pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 7, &tracker)
            .await
            .unwrap();

        let sizes = backend.batch_sizes().await;
        assert_eq!(sizes, vec![7, 7, 7, 2]);
        assert!(sizes.iter().all(|&s| s <= 7));
    }

    #[tokio::test]
    async fn failed_transform_skips_the_record_but_counts_it() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(10)));
        let mut scroller = open(&backend, 10, 0).await;
        let tracker = ProgressTracker::new("reindex");
        let transform = FailingOn(vec!["doc-2".to_string()]);

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &transform, 10, &tracker)
            .await
            .unwrap();

        // Records seen and operations written intentionally diverge.
        assert_eq!(outcome.docs_seen, 10);
        assert_eq!(outcome.ops_written, 9);
        assert_eq!(outcome.transform_failures, 1);
        assert_eq!(backend.batch_sizes().await, vec![9]);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_finished() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(2500)));
        let mut scroller = open(&backend, 1000, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 1000, &tracker)
            .await
            .unwrap();

        let processed: Vec<u64> = outcome.reports.iter().map(|r| r.processed).collect();
        assert_eq!(processed, vec![1000, 2000, 2500]);
        assert!(processed.windows(2).all(|w| w[0] <= w[1]));
        assert!(outcome.reports.iter().rev().skip(1).all(|r| !r.finished));

        let last = outcome.reports.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.processed, outcome.docs_seen);
    }

    #[tokio::test]
    async fn version_conflict_heals_within_retry_budget() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(5)).conflict_on("doc-1", 1));
        let mut scroller = open(&backend, 5, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 5, &tracker)
            .await
            .unwrap();

        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.ops_written, 5);
        // One batch, plus one individual re-submission for the conflict.
        assert_eq!(backend.batch_sizes().await, vec![5, 1]);
    }

    #[tokio::test]
    async fn persistent_conflict_lands_in_failed() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(5)).conflict_on("doc-1", 10));
        let mut scroller = open(&backend, 5, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 2)
            .run(&mut scroller, &DeleteMatching, 5, &tracker)
            .await
            .unwrap();

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id, "doc-1");
        assert_eq!(outcome.ops_written, 4);
        // Initial batch plus retry_on_conflict re-submissions.
        assert_eq!(backend.batch_sizes().await, vec![5, 1, 1]);
    }

    #[tokio::test]
    async fn rejected_document_is_not_retried() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(3)).reject_on("doc-0"));
        let mut scroller = open(&backend, 3, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 3)
            .run(&mut scroller, &DeleteMatching, 3, &tracker)
            .await
            .unwrap();

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(backend.batch_sizes().await, vec![3]);
    }

    #[tokio::test]
    async fn cancellation_aborts_before_any_work() {
        let backend = Arc::new(MemoryBackend::with_hits(hits(100)));
        let mut scroller = open(&backend, 10, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let pipeline = BulkPipeline::new(backend.clone(), RetryPolicy::none(), 1, cancel);

        let err = pipeline
            .run(&mut scroller, &DeleteMatching, 10, &tracker)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert!(backend.bulk_calls().await.is_empty());
    }

    #[tokio::test]
    async fn short_scroll_still_emits_final_report() {
        // Backend advertises 50 hits but only ever serves 30.
        let backend = Arc::new(MemoryBackend::with_hits(hits(30)).advertising_total(50));
        let mut scroller = open(&backend, 10, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 20, &tracker)
            .await
            .unwrap();

        assert_eq!(outcome.docs_seen, 30);
        assert_eq!(backend.batch_sizes().await, vec![20, 10]);
        let last = outcome.reports.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.processed, 30);
    }

    #[tokio::test]
    async fn empty_result_set_reports_zero_of_zero() {
        let backend = Arc::new(MemoryBackend::with_hits(Vec::new()));
        let mut scroller = open(&backend, 10, 0).await;
        let tracker = ProgressTracker::new("reindex");

        let outcome = pipeline(&backend, 1)
            .run(&mut scroller, &DeleteMatching, 10, &tracker)
            .await
            .unwrap();

        assert_eq!(outcome.docs_seen, 0);
        assert!(backend.bulk_calls().await.is_empty());
        let last = outcome.reports.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.processed, 0);
        assert_eq!(last.total, 0);
    }
}
