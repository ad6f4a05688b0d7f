use crate::{
    auth::{Principal, ensure_admin},
    error::JobError,
    pipeline::BulkPipeline,
    progress::ProgressTracker,
    retry::RetryPolicy,
    scroll::{ScrollConfig, Scroller},
    transform::HitTransform,
};
use connectors::backend::SearchBackend;
use model::job::{JobOptions, JobReceipt};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// One bulk mutation job: a query, a per-job transform, and options.
///
/// Cursor and batch state live only for the duration of `run`; a job
/// value can be run repeatedly and each run is independent.
pub struct BulkJob {
    index: String,
    query: Value,
    transform: Arc<dyn HitTransform>,
    options: JobOptions,
}

impl BulkJob {
    pub fn new(
        index: &str,
        query: Value,
        transform: Arc<dyn HitTransform>,
        options: JobOptions,
    ) -> Result<Self, JobError> {
        let options = options.validated()?;
        Ok(BulkJob {
            index: index.to_string(),
            query,
            transform,
            options,
        })
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }

    /// Authorization, scroll open, pipeline run, receipt.
    pub async fn run(
        &self,
        backend: Arc<dyn SearchBackend>,
        principal: &Principal,
        cancel: CancellationToken,
    ) -> Result<JobReceipt, JobError> {
        if self.options.admin_only {
            ensure_admin(principal)?;
        }

        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            label = %self.options.label,
            index = %self.index,
            "Starting bulk job"
        );

        let retry = RetryPolicy::for_backend();
        let config = ScrollConfig::new(&self.index, self.query.clone())
            .with_page_size(self.options.page_size)
            .with_max_docs(self.options.max_docs);

        let mut scroller = Scroller::open(backend.clone(), config, retry.clone()).await?;
        info!(
            run_id = %run_id,
            total_hits = scroller.total_hits(),
            max_docs = self.options.max_docs,
            "Scroll opened"
        );

        let pipeline = BulkPipeline::new(backend, retry, self.options.retry_on_conflict, cancel);
        let tracker = ProgressTracker::new(&self.options.label);
        let result = pipeline
            .run(
                &mut scroller,
                self.transform.as_ref(),
                self.options.docs_per_request,
                &tracker,
            )
            .await;

        // Release the scroll context whether the run succeeded or not.
        scroller.close().await;
        let outcome = result?;

        let snapshot = pipeline.metrics().snapshot();
        info!(
            run_id = %run_id,
            docs_seen = snapshot.docs_seen,
            batches = snapshot.batches_flushed,
            transform_failures = snapshot.transform_failures,
            write_failures = snapshot.write_failures,
            "Bulk job finished"
        );

        Ok(JobReceipt::updated(outcome.docs_seen, outcome.failed))
    }
}
