use crate::transform::{HitTransform, TransformError};
use model::{document::DocumentHit, ops::WriteOp};
use serde_json::{Map, Value};

/// Partial update writing one field of every matching document to a
/// fixed value.
pub struct SetField {
    field: String,
    value: Value,
    retry_on_conflict: u32,
}

impl SetField {
    pub fn new(field: &str, value: Value, retry_on_conflict: u32) -> Self {
        SetField {
            field: field.to_string(),
            value,
            retry_on_conflict,
        }
    }
}

impl HitTransform for SetField {
    fn apply(&self, hit: &DocumentHit) -> Result<Option<WriteOp>, TransformError> {
        if self.field.is_empty() {
            return Err(TransformError::Failed {
                id: hit.id.clone(),
                reason: "empty field name".to_string(),
            });
        }

        let mut doc = Map::new();
        doc.insert(self.field.clone(), self.value.clone());

        Ok(Some(WriteOp::Update {
            index: hit.index.clone(),
            id: hit.id.clone(),
            doc: Value::Object(doc),
            retry_on_conflict: self.retry_on_conflict,
        }))
    }
}
