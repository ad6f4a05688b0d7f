use model::{document::DocumentHit, ops::WriteOp};
use thiserror::Error;

pub mod delete;
pub mod reindex;
pub mod set_field;

pub use delete::DeleteMatching;
pub use reindex::Reindex;
pub use set_field::SetField;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Transformation failed for document '{id}': {reason}")]
    Failed { id: String, reason: String },

    #[error("Document '{id}' has no usable source")]
    MissingSource { id: String },
}

/// Turns one scrolled document into at most one write operation.
///
/// An `Ok(None)` filters the document out of the batch; an error is
/// recovered by the pipeline: the document is skipped and the run
/// continues.
pub trait HitTransform: Send + Sync {
    fn apply(&self, hit: &DocumentHit) -> Result<Option<WriteOp>, TransformError>;
}
