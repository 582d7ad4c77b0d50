use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalogue::ThreatCategory;

// ---------------------------------------------------------------------------
// QueryState
// ---------------------------------------------------------------------------

/// Lifecycle state of an Athena query execution, as reported by the service.
///
/// Transitions: `Queued → Running → Succeeded | Failed | Cancelled`. The
/// service may skip `Queued` entirely; states are never computed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// QueryExecution
// ---------------------------------------------------------------------------

/// Snapshot of one query execution as last read from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecution {
    pub id: String,
    pub state: QueryState,
    /// `StateChangeReason` from the service, when it gave one.
    pub failure_reason: Option<String>,
}

impl QueryExecution {
    pub fn new(id: impl Into<String>, state: QueryState) -> Self {
        Self {
            id: id.into(),
            state,
            failure_reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

// ---------------------------------------------------------------------------
// RawRow
// ---------------------------------------------------------------------------

/// One row of the tabular result set. Every cell is a string, whatever its
/// logical type in the table; NULL cells arrive as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(pub Vec<String>);

impl RawRow {
    /// Cell at `index`, or `""` when the row is too short.
    pub fn cell(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RawRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        RawRow(iter.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// A suspicious CloudTrail event extracted from one result row.
///
/// `event_time` is kept exactly as the engine returned it (ISO-8601 text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "eventTime")]
    pub event_time: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "userIdentity")]
    pub user_identity: String,
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    pub region: String,
    /// Catalogue category the event name matched, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ThreatCategory>,
}
