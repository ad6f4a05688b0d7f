use crate::{
    error::PipelineError,
    retry::{RetryPolicy, classify_backend_error},
};
use connectors::backend::SearchBackend;
use model::document::DocumentHit;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How a scroll is opened against the backend.
#[derive(Debug, Clone)]
pub struct ScrollConfig {
    pub index: String,
    pub query: Value,
    pub page_size: usize,
    /// Upper bound on records yielded; 0 means unbounded.
    pub max_docs: u64,
    pub keep_alive: Duration,
}

impl ScrollConfig {
    pub fn new(index: &str, query: Value) -> Self {
        ScrollConfig {
            index: index.to_string(),
            query,
            page_size: 1000,
            max_docs: 0,
            keep_alive: Duration::from_secs(60),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_docs(mut self, max_docs: u64) -> Self {
        self.max_docs = max_docs;
        self
    }
}

/// Pull-style cursor over a backend scroll: yields hits one at a time in
/// backend order, fetching pages transparently, and never yields past
/// `min(total_hits, max_docs)` records.
///
/// Owned exclusively by one pipeline run; there is no cross-run state.
pub struct Scroller {
    backend: Arc<dyn SearchBackend>,
    retry: RetryPolicy,
    keep_alive: Duration,
    scroll_id: Option<String>,
    buffer: VecDeque<DocumentHit>,
    total_hits: u64,
    max_docs: u64,
    docs_seen: u64,
    exhausted: bool,
}

impl Scroller {
    /// Begin backend-side pagination. `total_hits` is established from
    /// the first response and stays stable afterwards.
    pub async fn open(
        backend: Arc<dyn SearchBackend>,
        config: ScrollConfig,
        retry: RetryPolicy,
    ) -> Result<Self, PipelineError> {
        let keep_alive = config.keep_alive;
        let first = {
            let backend = backend.clone();
            retry
                .run(
                    || {
                        let backend = backend.clone();
                        let index = config.index.clone();
                        let query = config.query.clone();
                        let page_size = config.page_size;
                        async move {
                            backend
                                .open_scroll(&index, &query, page_size, keep_alive)
                                .await
                        }
                    },
                    classify_backend_error,
                )
                .await?
        };

        debug!(
            index = %config.index,
            total_hits = first.total_hits,
            max_docs = config.max_docs,
            "Scroll opened"
        );

        let exhausted = first.exhausted;
        Ok(Scroller {
            backend,
            retry,
            keep_alive,
            scroll_id: first.scroll_id.clone(),
            total_hits: first.total_hits,
            max_docs: config.max_docs,
            docs_seen: 0,
            exhausted,
            buffer: first.hits.into(),
        })
    }

    /// Next hit in backend order, or `None` once
    /// `docs_seen == min(total_hits, max_docs)` or the backend reports
    /// no more pages.
    pub async fn next(&mut self) -> Result<Option<DocumentHit>, PipelineError> {
        if self.docs_seen >= self.effective_total() {
            self.exhausted = true;
            return Ok(None);
        }

        if self.buffer.is_empty() {
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_next_page().await?;
            if self.buffer.is_empty() {
                self.exhausted = true;
                return Ok(None);
            }
        }

        match self.buffer.pop_front() {
            Some(hit) => {
                self.docs_seen += 1;
                Ok(Some(hit))
            }
            None => Ok(None),
        }
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn max_docs(&self) -> u64 {
        self.max_docs
    }

    pub fn docs_seen(&self) -> u64 {
        self.docs_seen
    }

    /// Number of records this cursor will yield at most:
    /// `min(total_hits, max_docs)`, with 0 meaning no cap.
    pub fn effective_total(&self) -> u64 {
        if self.max_docs == 0 {
            self.total_hits
        } else {
            self.total_hits.min(self.max_docs)
        }
    }

    /// Release the server-side scroll context. Best effort: a failure is
    /// logged, not propagated.
    pub async fn close(&mut self) {
        if let Some(scroll_id) = self.scroll_id.take()
            && let Err(err) = self.backend.close_scroll(&scroll_id).await
        {
            warn!(error = %err, "Failed to release scroll context");
        }
    }

    async fn fetch_next_page(&mut self) -> Result<(), PipelineError> {
        let Some(scroll_id) = self.scroll_id.clone() else {
            self.exhausted = true;
            return Ok(());
        };

        let backend = self.backend.clone();
        let keep_alive = self.keep_alive;
        let page = self
            .retry
            .run(
                || {
                    let backend = backend.clone();
                    let scroll_id = scroll_id.clone();
                    async move { backend.fetch_scroll_page(&scroll_id, keep_alive).await }
                },
                classify_backend_error,
            )
            .await?;

        self.scroll_id = page.scroll_id;
        if page.exhausted {
            self.exhausted = true;
        }
        self.buffer.extend(page.hits);
        Ok(())
    }
}
