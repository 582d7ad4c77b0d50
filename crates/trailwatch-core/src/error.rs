use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrailwatchError {
    #[error("query submission rejected: {0}")]
    Submission(String),

    #[error("Athena query failed: {reason}")]
    QueryExecutionFailed { execution_id: String, reason: String },

    #[error("Athena query {execution_id} did not finish within {}s", waited.as_secs())]
    Timeout {
        execution_id: String,
        waited: Duration,
    },

    #[error("query service error: {0}")]
    QueryService(String),

    #[error("alert publish failed: {0}")]
    Publish(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TrailwatchError {
    /// Errors that end the query lifecycle without a result set. The job
    /// reports these as a failed run rather than propagating them.
    pub fn is_execution_outcome(&self) -> bool {
        matches!(
            self,
            TrailwatchError::QueryExecutionFailed { .. } | TrailwatchError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrailwatchError>;
