use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One backend mutation derived from one scrolled document.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    /// Full (re-)index of a document.
    Index {
        index: String,
        id: String,
        source: Value,
    },

    /// Partial update merging `doc` into the stored document.
    /// `retry_on_conflict` is passed through to the backend, which retries
    /// the single document that many times on a version conflict.
    Update {
        index: String,
        id: String,
        doc: Value,
        retry_on_conflict: u32,
    },

    /// Delete by id.
    Delete { index: String, id: String },
}

impl WriteOp {
    pub fn doc_id(&self) -> &str {
        match self {
            WriteOp::Index { id, .. } => id,
            WriteOp::Update { id, .. } => id,
            WriteOp::Delete { id, .. } => id,
        }
    }

    pub fn index(&self) -> &str {
        match self {
            WriteOp::Index { index, .. } => index,
            WriteOp::Update { index, .. } => index,
            WriteOp::Delete { index, .. } => index,
        }
    }

    /// Action name as it appears on the bulk wire format.
    pub fn action(&self) -> &'static str {
        match self {
            WriteOp::Index { .. } => "index",
            WriteOp::Update { .. } => "update",
            WriteOp::Delete { .. } => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_cover_all_variants() {
        let ops = [
            WriteOp::Index {
                index: "metadata".into(),
                id: "a".into(),
                source: json!({"title": "x"}),
            },
            WriteOp::Update {
                index: "metadata".into(),
                id: "b".into(),
                doc: json!({"status": "approved"}),
                retry_on_conflict: 1,
            },
            WriteOp::Delete {
                index: "metadata".into(),
                id: "c".into(),
            },
        ];

        assert_eq!(
            ops.iter().map(|op| op.doc_id()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            ops.iter().map(|op| op.action()).collect::<Vec<_>>(),
            vec!["index", "update", "delete"]
        );
        assert!(ops.iter().all(|op| op.index() == "metadata"));
    }
}
