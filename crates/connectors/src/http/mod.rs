use crate::{
    backend::SearchBackend,
    error::BackendError,
    http::wire::{BulkResponse, SearchResponse, encode_bulk_body},
    page::ScrollPage,
};
use async_trait::async_trait;
use model::{bulk::BulkReport, ops::WriteOp};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

mod wire;

/// REST client for an Elasticsearch-compatible search backend.
///
/// Every call carries the configured request timeout; a timeout or
/// connection failure surfaces as `BackendError::Unavailable`.
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

impl HttpSearchBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        Ok(HttpSearchBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_page(&self, response: Response) -> Result<ScrollPage, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::scroll_status_error(status, response).await);
        }
        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.into_page())
    }

    async fn scroll_status_error(status: StatusCode, response: Response) -> BackendError {
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => BackendError::CursorExpired {
                scroll_id: extract_scroll_id(&body).unwrap_or_else(|| "unknown".to_string()),
            },
            s if s.is_server_error()
                || s == StatusCode::REQUEST_TIMEOUT
                || s == StatusCode::TOO_MANY_REQUESTS =>
            {
                BackendError::Unavailable(format!("{status}: {body}"))
            }
            _ => BackendError::Rejected(format!("{status}: {body}")),
        }
    }
}

fn keep_alive_param(keep_alive: Duration) -> String {
    format!("{}s", keep_alive.as_secs().max(1))
}

fn extract_scroll_id(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .pointer("/_scroll_id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn open_scroll(
        &self,
        index: &str,
        query: &Value,
        page_size: usize,
        keep_alive: Duration,
    ) -> Result<ScrollPage, BackendError> {
        let url = self.url(&format!("{index}/_search"));
        debug!(index, page_size, "Opening scroll");

        let response = self
            .client
            .post(&url)
            .query(&[("scroll", keep_alive_param(keep_alive))])
            .json(&json!({ "size": page_size, "query": query }))
            .send()
            .await?;

        self.read_page(response).await
    }

    async fn fetch_scroll_page(
        &self,
        scroll_id: &str,
        keep_alive: Duration,
    ) -> Result<ScrollPage, BackendError> {
        let url = self.url("_search/scroll");

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "scroll": keep_alive_param(keep_alive),
                "scroll_id": scroll_id,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::CursorExpired {
                scroll_id: scroll_id.to_string(),
            });
        }
        self.read_page(response).await
    }

    async fn close_scroll(&self, scroll_id: &str) -> Result<(), BackendError> {
        let url = self.url("_search/scroll");

        let response = self
            .client
            .delete(&url)
            .json(&json!({ "scroll_id": [scroll_id] }))
            .send()
            .await?;

        // A missing context is fine: it already timed out server-side.
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(BackendError::InvalidResponse(format!(
                "clear scroll returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn execute_bulk(&self, ops: &[WriteOp]) -> Result<BulkReport, BackendError> {
        let url = self.url("_bulk");
        let body = encode_bulk_body(ops)?;
        debug!(ops = ops.len(), "Submitting bulk request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(BackendError::Unavailable(format!("{status}: {body}")));
            }
            return Err(BackendError::Rejected(format!("{status}: {body}")));
        }

        let parsed: BulkResponse = response.json().await?;
        Ok(parsed.into_report())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let response = self.client.get(&self.base_url).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "ping returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
