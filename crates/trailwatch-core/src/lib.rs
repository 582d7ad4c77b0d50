//! Scheduled CloudTrail threat detection.
//!
//! One run queries the CloudTrail table in Athena for a catalogue of
//! suspicious API actions, waits for the query, turns the result rows into
//! [`Finding`]s and publishes a single SNS alert summarizing them.
//!
//! The Athena and SNS clients sit behind the [`QueryService`] and
//! [`NotificationSink`] traits; [`DetectionJob`] borrows both, so tests can
//! substitute fakes.

pub mod alert;
pub mod athena;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod job;
pub mod notify;
pub mod parser;
pub mod poller;
pub mod query;
pub mod results;
pub mod types;

pub use alert::{build_alert_payload, AlertPayload, ALERT_SUBJECT};
pub use athena::{start_query, AthenaClient, QueryService, QueryTarget, ResultPage};
pub use catalogue::{ActionCatalogue, CatalogueEntry, ThreatCategory};
pub use config::DetectionConfig;
pub use error::{Result, TrailwatchError};
pub use job::{DetectionJob, JobResult};
pub use notify::{publish_alert, NotificationSink, SnsPublisher};
pub use parser::{parse_row, parse_rows};
pub use poller::{wait_for_completion, PollPolicy, Sleeper, ThreadSleeper};
pub use query::build_detection_query;
pub use results::fetch_result_rows;
pub use types::{Finding, QueryExecution, QueryState, RawRow};
