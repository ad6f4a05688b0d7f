use crate::transform::{HitTransform, TransformError};
use model::{document::DocumentHit, ops::WriteOp};

/// Re-submits each scrolled document as a full index operation, either
/// back into its own index or into a target index.
pub struct Reindex {
    target: Option<String>,
}

impl Reindex {
    pub fn in_place() -> Self {
        Reindex { target: None }
    }

    pub fn into_index(target: &str) -> Self {
        Reindex {
            target: Some(target.to_string()),
        }
    }
}

impl HitTransform for Reindex {
    fn apply(&self, hit: &DocumentHit) -> Result<Option<WriteOp>, TransformError> {
        if hit.source.is_null() {
            return Err(TransformError::MissingSource { id: hit.id.clone() });
        }

        let index = self
            .target
            .clone()
            .unwrap_or_else(|| hit.index.clone());

        Ok(Some(WriteOp::Index {
            index,
            id: hit.id.clone(),
            source: hit.source.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn reindexes_into_own_index_by_default() {
        let hit = DocumentHit::new("metadata", "a", json!({"title": "x"}));
        let op = Reindex::in_place().apply(&hit).unwrap().unwrap();
        assert_eq!(op.index(), "metadata");
        assert_eq!(op.action(), "index");
    }

    #[test]
    fn target_index_overrides() {
        let hit = DocumentHit::new("metadata", "a", json!({"title": "x"}));
        let op = Reindex::into_index("metadata_v2")
            .apply(&hit)
            .unwrap()
            .unwrap();
        assert_eq!(op.index(), "metadata_v2");
    }

    #[test]
    fn missing_source_is_an_error() {
        let hit = DocumentHit::new("metadata", "a", Value::Null);
        assert!(Reindex::in_place().apply(&hit).is_err());
    }
}
