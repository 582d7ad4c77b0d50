//! One detection run, end to end.
//!
//! ```text
//! build_detection_query ─▶ start_query ─▶ wait_for_completion ─▶ fetch_result_rows
//!                                               │                      │
//!                                   failed/timed out: 500        no rows: 200
//!                                                                      ▼
//!                             publish_alert ◀─ build_alert_payload ◀─ parse_rows
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::alert::build_alert_payload;
use crate::athena::{start_query, QueryService};
use crate::catalogue::ActionCatalogue;
use crate::config::DetectionConfig;
use crate::error::{Result, TrailwatchError};
use crate::notify::{publish_alert, NotificationSink};
use crate::parser::parse_rows;
use crate::poller::{wait_for_completion, Sleeper};
use crate::query::build_detection_query;
use crate::results::fetch_result_rows;

pub const NOTHING_FOUND: &str = "nothing sus was found";

// ---------------------------------------------------------------------------
// JobResult
// ---------------------------------------------------------------------------

/// What the scheduler that triggered the run gets back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl JobResult {
    pub fn nothing_found() -> Self {
        Self {
            status_code: 200,
            body: NOTHING_FOUND.to_string(),
        }
    }

    pub fn alert_sent(findings: usize) -> Self {
        Self {
            status_code: 200,
            body: format!("Alert sent: {findings} findings"),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

// ---------------------------------------------------------------------------
// DetectionJob
// ---------------------------------------------------------------------------

/// Wires the query service and notification sink into a single run.
///
/// The only component that decides whether an alert is sent.
pub struct DetectionJob<'a> {
    pub queries: &'a dyn QueryService,
    pub sink: &'a dyn NotificationSink,
    pub sleeper: &'a dyn Sleeper,
    pub config: &'a DetectionConfig,
    pub catalogue: &'a ActionCatalogue,
}

impl DetectionJob<'_> {
    /// Run the detection once.
    ///
    /// A query that fails or times out becomes a 500 [`JobResult`]; a query
    /// that times out is also cancelled. Submission, transport and publish
    /// errors are returned as `Err`.
    pub fn run(&self) -> Result<JobResult> {
        info!(
            lookback_minutes = self.config.lookback_minutes.get(),
            actions = self.catalogue.len(),
            "detection run starting"
        );

        let sql = build_detection_query(
            self.config.lookback_minutes,
            self.catalogue,
            &self.config.table,
        );
        let execution_id = start_query(self.queries, &sql, &self.config.target())?;

        let policy = self.config.poll_policy();
        if let Err(err) = wait_for_completion(self.queries, self.sleeper, &execution_id, &policy)
        {
            if !err.is_execution_outcome() {
                return Err(err);
            }
            if matches!(err, TrailwatchError::Timeout { .. }) {
                if let Err(cancel_err) = self.queries.cancel(&execution_id) {
                    warn!(execution_id = %execution_id, error = %cancel_err, "could not stop timed-out query");
                }
            }
            return Ok(JobResult::failed(err.to_string()));
        }

        let rows = fetch_result_rows(self.queries, &execution_id)?;
        if rows.is_empty() {
            info!(execution_id = %execution_id, "{NOTHING_FOUND}");
            return Ok(JobResult::nothing_found());
        }

        let findings = parse_rows(&rows, self.catalogue);
        let count = findings.len();
        let payload = build_alert_payload(findings);
        publish_alert(self.sink, &self.config.topic_arn, &payload)?;

        Ok(JobResult::alert_sent(count))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
