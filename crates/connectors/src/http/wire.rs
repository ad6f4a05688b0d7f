use crate::{error::BackendError, page::ScrollPage};
use model::{
    bulk::{BulkReport, DocFailure, FailureKind},
    document::DocumentHit,
    ops::WriteOp,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

/// Encode a bulk body as newline-delimited JSON: one action line per
/// operation, followed by a source line for index/update actions.
pub(crate) fn encode_bulk_body(ops: &[WriteOp]) -> Result<String, BackendError> {
    let mut body = String::new();
    for op in ops {
        let (action, payload) = match op {
            WriteOp::Index { index, id, source } => (
                json!({ "index": { "_index": index, "_id": id } }),
                Some(source.clone()),
            ),
            WriteOp::Update {
                index,
                id,
                doc,
                retry_on_conflict,
            } => (
                json!({
                    "update": {
                        "_index": index,
                        "_id": id,
                        "retry_on_conflict": retry_on_conflict,
                    }
                }),
                Some(json!({ "doc": doc })),
            ),
            WriteOp::Delete { index, id } => {
                (json!({ "delete": { "_index": index, "_id": id } }), None)
            }
        };

        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        if let Some(payload) = payload {
            body.push_str(&serde_json::to_string(&payload)?);
            body.push('\n');
        }
    }
    Ok(body)
}

/// `hits.total` arrives as a bare number on older backends and as
/// `{value, relation}` on newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TotalHits {
    Legacy(u64),
    Tracked { value: u64 },
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Legacy(value) => *value,
            TotalHits::Tracked { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHits {
    total: TotalHits,
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: SearchHits,
}

impl SearchResponse {
    pub(crate) fn into_page(self) -> ScrollPage {
        let total_hits = self.hits.total.value();
        let hits: Vec<DocumentHit> = self
            .hits
            .hits
            .into_iter()
            .map(|h| DocumentHit {
                index: h.index,
                id: h.id,
                source: h.source,
            })
            .collect();
        let exhausted = hits.is_empty();

        ScrollPage {
            hits,
            scroll_id: self.scroll_id,
            total_hits,
            exhausted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkItemError {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkItem {
    #[serde(rename = "_index", default)]
    index: String,
    #[serde(rename = "_id", default)]
    id: String,
    status: u16,
    error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    errors: bool,
    /// Each item is a single-key map from action name to the result.
    items: Vec<HashMap<String, BulkItem>>,
}

impl BulkResponse {
    pub(crate) fn into_report(self) -> BulkReport {
        if !self.errors {
            return BulkReport::ok(self.took);
        }

        let failures = self
            .items
            .into_iter()
            .filter_map(|entry| entry.into_values().next())
            .filter_map(|item| {
                let error = item.error?;
                let kind = if item.status == 409 || error.kind.contains("version_conflict") {
                    FailureKind::VersionConflict
                } else {
                    FailureKind::Rejected
                };
                Some(DocFailure {
                    index: item.index,
                    id: item.id,
                    kind,
                    reason: error.reason,
                })
            })
            .collect();

        BulkReport {
            took_ms: self.took,
            failures,
        }
    }
}
