//! Notification sink contract and its SNS implementation.

use std::time::Duration;

use tracing::{debug, info};

use crate::alert::{AlertPayload, ALERT_SUBJECT};
use crate::athena::describe_error;
use crate::error::{Result, TrailwatchError};

pub trait NotificationSink {
    /// Deliver `body` to `topic`. Delivery is not confirmed beyond the call
    /// returning `Ok`.
    fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<()>;
}

/// Serialize `payload` and hand it to `sink` as a single notification.
pub fn publish_alert(sink: &dyn NotificationSink, topic: &str, payload: &AlertPayload) -> Result<()> {
    let message = payload.to_message()?;
    debug!(payload = %message, "alert payload");
    info!(topic, findings = payload.findings.len(), "publishing alert");
    sink.publish(topic, ALERT_SUBJECT, &message)?;
    info!(topic, "alert published");
    Ok(())
}

// ---------------------------------------------------------------------------
// SnsPublisher
// ---------------------------------------------------------------------------

const SNS_API_VERSION: &str = "2010-03-31";

/// Publishes through the SNS query API (form-encoded `Action=Publish`).
pub struct SnsPublisher {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl SnsPublisher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

impl NotificationSink for SnsPublisher {
    fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<()> {
        let form = [
            ("Action", "Publish"),
            ("Version", SNS_API_VERSION),
            ("TopicArn", topic),
            ("Subject", subject),
            ("Message", body),
        ];
        let resp = self.http.post(&self.endpoint).form(&form).send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(TrailwatchError::Publish(describe_error(status.as_u16(), &text)));
        }
        Ok(())
    }
}
