//! Query service contract and its Athena implementation.
//!
//! [`QueryService`] is the narrow submit/poll/fetch surface the job depends
//! on. [`AthenaClient`] speaks the Athena JSON 1.1 protocol over HTTP:
//!
//! ```text
//! POST /
//! Content-Type: application/x-amz-json-1.1
//! X-Amz-Target: AmazonAthena.<Operation>
//! ```
//!
//! Request signing is left to the environment (the endpoint is typically a
//! signing proxy or a local emulator).

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Result, TrailwatchError};
use crate::types::{QueryExecution, QueryState, RawRow};

// ---------------------------------------------------------------------------
// QueryService
// ---------------------------------------------------------------------------

/// One page of a query's tabular result, header row included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub rows: Vec<RawRow>,
    /// Set when the service holds further pages.
    pub next_token: Option<String>,
}

pub trait QueryService {
    /// Submit `query` and return the execution handle without waiting.
    fn submit(&self, query: &str, database: &str, workgroup: &str) -> Result<String>;

    /// Current state of an execution.
    fn status(&self, execution_id: &str) -> Result<QueryExecution>;

    /// First page of the result set of a finished execution.
    fn result_page(&self, execution_id: &str) -> Result<ResultPage>;

    /// Ask the service to stop an execution.
    fn cancel(&self, execution_id: &str) -> Result<()>;
}

/// Where detection queries run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub database: String,
    pub workgroup: String,
}

/// Submit the detection query and return its execution handle.
///
/// A rejection by the service surfaces as [`TrailwatchError::Submission`] and
/// is not retried.
pub fn start_query(
    service: &dyn QueryService,
    query_text: &str,
    target: &QueryTarget,
) -> Result<String> {
    let execution_id = service.submit(query_text, &target.database, &target.workgroup)?;
    info!(
        execution_id = %execution_id,
        database = %target.database,
        workgroup = %target.workgroup,
        "started Athena query"
    );
    Ok(execution_id)
}

// ---------------------------------------------------------------------------
// AthenaClient
// ---------------------------------------------------------------------------

const TARGET_PREFIX: &str = "AmazonAthena";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

pub struct AthenaClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl AthenaClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: serde_json::Value,
    ) -> std::result::Result<T, CallError> {
        debug!(operation, endpoint = %self.endpoint, "athena request");
        let resp = self
            .http
            .post(&self.endpoint)
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", format!("{TARGET_PREFIX}.{operation}"))
            .json(&body)
            .send()
            .map_err(CallError::Transport)?;

        let status = resp.status();
        let text = resp.text().map_err(CallError::Transport)?;
        if !status.is_success() {
            return Err(CallError::Rejected(describe_error(status.as_u16(), &text)));
        }
        serde_json::from_str(&text).map_err(|e| {
            CallError::Rejected(format!("unexpected {operation} response: {e}"))
        })
    }
}

impl QueryService for AthenaClient {
    fn submit(&self, query: &str, database: &str, workgroup: &str) -> Result<String> {
        let out: StartQueryExecutionOutput = self
            .call(
                "StartQueryExecution",
                json!({
                    "QueryString": query,
                    "QueryExecutionContext": { "Database": database },
                    "WorkGroup": workgroup,
                }),
            )
            .map_err(|e| match e {
                CallError::Rejected(msg) => TrailwatchError::Submission(msg),
                CallError::Transport(err) => TrailwatchError::Http(err),
            })?;
        Ok(out.query_execution_id)
    }

    fn status(&self, execution_id: &str) -> Result<QueryExecution> {
        let out: GetQueryExecutionOutput = self
            .call(
                "GetQueryExecution",
                json!({ "QueryExecutionId": execution_id }),
            )
            .map_err(CallError::into_service_error)?;
        let status = out.query_execution.status;
        Ok(QueryExecution {
            id: execution_id.to_string(),
            state: status.state,
            failure_reason: status.state_change_reason,
        })
    }

    fn result_page(&self, execution_id: &str) -> Result<ResultPage> {
        let out: GetQueryResultsOutput = self
            .call(
                "GetQueryResults",
                json!({ "QueryExecutionId": execution_id }),
            )
            .map_err(CallError::into_service_error)?;
        let rows = out
            .result_set
            .map(|set| set.rows)
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.data
                    .into_iter()
                    .map(|cell| cell.var_char_value.unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(ResultPage {
            rows,
            next_token: out.next_token,
        })
    }

    fn cancel(&self, execution_id: &str) -> Result<()> {
        self.call::<serde_json::Value>(
            "StopQueryExecution",
            json!({ "QueryExecutionId": execution_id }),
        )
        .map_err(CallError::into_service_error)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

enum CallError {
    /// Non-2xx status or an unreadable body.
    Rejected(String),
    Transport(reqwest::Error),
}

impl CallError {
    fn into_service_error(self) -> TrailwatchError {
        match self {
            CallError::Rejected(msg) => TrailwatchError::QueryService(msg),
            CallError::Transport(err) => TrailwatchError::Http(err),
        }
    }
}

/// Render an AWS JSON error body (`{"__type": "...#Code", "Message": "..."}`).
pub(crate) fn describe_error(status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|v| v["__type"].as_str())
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string());
    let message = parsed.as_ref().and_then(|v| {
        v["Message"]
            .as_str()
            .or_else(|| v["message"].as_str())
            .map(str::to_string)
    });
    match (code, message) {
        (Some(code), Some(message)) => format!("{code} (HTTP {status}): {message}"),
        (Some(code), None) => format!("{code} (HTTP {status})"),
        (None, Some(message)) => format!("HTTP {status}: {message}"),
        (None, None) => format!("HTTP {status}: {}", body.trim()),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionOutput {
    query_execution_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryExecutionOutput {
    query_execution: QueryExecutionBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionBody {
    status: StatusBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StatusBody {
    state: QueryState,
    #[serde(default)]
    state_change_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsOutput {
    #[serde(default)]
    result_set: Option<ResultSetBody>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultSetBody {
    #[serde(default)]
    rows: Vec<RowBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RowBody {
    #[serde(default)]
    data: Vec<CellBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CellBody {
    #[serde(default)]
    var_char_value: Option<String>,
}
