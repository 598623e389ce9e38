//! Analysis-provider collaborator contract.

use async_trait::async_trait;
use ol_protocol::Recommendation;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Parameters of one analysis call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisRequest {
    /// Optional subject, e.g. an incident id.
    pub subject: Option<String>,

    /// Optional analysis type, e.g. `"disk"` for a targeted analysis.
    pub analysis_type: Option<String>,

    /// Auxiliary parameters for targeted analyses (e.g. a `path`).
    pub params: BTreeMap<String, Value>,
}

impl AnalysisRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_analysis_type(mut self, analysis_type: impl Into<String>) -> Self {
        self.analysis_type = Some(analysis_type.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("API call failed: {0}")]
    ApiError(String),
}

/// An AI-style analysis backend.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Configuration snapshot recorded (redacted) on the audit record.
    fn config(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    async fn analyze(&self, request: &AnalysisRequest)
        -> Result<Vec<Recommendation>, ProviderError>;
}
