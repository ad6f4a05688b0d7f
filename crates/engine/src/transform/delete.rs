use crate::transform::{HitTransform, TransformError};
use model::{document::DocumentHit, ops::WriteOp};

/// Deletes every matching document by id.
pub struct DeleteMatching;

impl HitTransform for DeleteMatching {
    fn apply(&self, hit: &DocumentHit) -> Result<Option<WriteOp>, TransformError> {
        Ok(Some(WriteOp::Delete {
            index: hit.index.clone(),
            id: hit.id.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deletes_by_id() {
        let hit = DocumentHit::new("metadata", "gone", json!({}));
        let op = DeleteMatching.apply(&hit).unwrap().unwrap();
        assert_eq!(op.action(), "delete");
        assert_eq!(op.doc_id(), "gone");
    }
}
