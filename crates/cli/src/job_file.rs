use crate::error::CliError;
use engine::{
    error::JobError,
    job::BulkJob,
    transform::{DeleteMatching, HitTransform, Reindex, SetField},
};
use model::job::JobOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// What the job does with each matching document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionSpec {
    /// Re-submit each document, optionally into a different index.
    Reindex {
        #[serde(default)]
        target: Option<String>,
    },

    /// Delete each matching document.
    Delete,

    /// Write one field of each matching document to a fixed value.
    SetField { field: String, value: Value },
}

/// On-disk description of one bulk job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    pub label: String,
    pub index: String,
    pub query: Value,
    pub action: ActionSpec,

    #[serde(default = "default_docs_per_request")]
    pub docs_per_request: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub max_docs: u64,

    #[serde(default = "default_retry_on_conflict")]
    pub retry_on_conflict: u32,

    #[serde(default = "default_admin_only")]
    pub admin_only: bool,
}

fn default_docs_per_request() -> usize {
    1000
}

fn default_page_size() -> usize {
    1000
}

fn default_retry_on_conflict() -> u32 {
    1
}

fn default_admin_only() -> bool {
    true
}

impl JobFile {
    pub fn parse(raw: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn options(&self) -> JobOptions {
        JobOptions {
            label: self.label.clone(),
            docs_per_request: self.docs_per_request,
            page_size: self.page_size,
            max_docs: self.max_docs,
            retry_on_conflict: self.retry_on_conflict,
            admin_only: self.admin_only,
        }
    }

    fn transform(&self) -> Arc<dyn HitTransform> {
        match &self.action {
            ActionSpec::Reindex { target: Some(t) } => Arc::new(Reindex::into_index(t)),
            ActionSpec::Reindex { target: None } => Arc::new(Reindex::in_place()),
            ActionSpec::Delete => Arc::new(DeleteMatching),
            ActionSpec::SetField { field, value } => Arc::new(SetField::new(
                field,
                value.clone(),
                self.retry_on_conflict,
            )),
        }
    }

    pub fn into_job(self) -> Result<BulkJob, JobError> {
        let transform = self.transform();
        let options = self.options();
        BulkJob::new(&self.index, self.query, transform, options)
    }
}
