use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One document yielded by the scroll, in backend order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    pub index: String,
    pub id: String,
    pub source: Value,
}

impl DocumentHit {
    pub fn new(index: &str, id: &str, source: Value) -> Self {
        DocumentHit {
            index: index.to_string(),
            id: id.to_string(),
            source,
        }
    }

    /// Top-level field of the document source, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.source.as_object().and_then(|obj| obj.get(name))
    }
}
