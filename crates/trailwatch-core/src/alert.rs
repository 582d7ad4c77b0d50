//! Alert payload assembly.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::types::Finding;

/// Subject line of every alert notification.
pub const ALERT_SUBJECT: &str = "[CTD] CloudTrail Threat Detection Alert";

/// The single notification sent for a run with at least one finding.
///
/// Field order is the serialized key order; the technique mapping is a
/// `BTreeMap` so its keys are sorted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertPayload {
    pub summary: String,
    pub findings: Vec<Finding>,
    #[serde(rename = "mitre mapping")]
    pub mitre_mapping: BTreeMap<String, String>,
}

impl AlertPayload {
    /// Pretty-printed JSON body for the notification.
    pub fn to_message(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Summarize `findings` and attach the ATT&CK techniques of every threat
/// category they matched. Findings whose event name matched no category add
/// nothing to the mapping.
pub fn build_alert_payload(findings: Vec<Finding>) -> AlertPayload {
    let mitre_mapping = findings
        .iter()
        .filter_map(|f| f.category)
        .map(|c| (c.label().to_string(), c.techniques().to_string()))
        .collect();

    let payload = AlertPayload {
        summary: format!("{} suspicious cloudtrail events detected", findings.len()),
        findings,
        mitre_mapping,
    };
    debug!(summary = %payload.summary, categories = payload.mitre_mapping.len(), "built alert payload");
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::ThreatCategory;

    fn finding(name: &str, category: Option<ThreatCategory>) -> Finding {
        Finding {
            event_time: "2024-05-01T10:00:00Z".into(),
            event_name: name.into(),
            user_identity: "alice".into(),
            source_ip: "198.51.100.4".into(),
            region: "us-east-1".into(),
            category,
        }
    }

    #[test]
    fn summary_counts_findings() {
        let payload = build_alert_payload(vec![
            finding("CreateUser", Some(ThreatCategory::PrivilegeEscalation)),
            finding("CreateAccessKey", Some(ThreatCategory::PrivilegeEscalation)),
            finding("StopLogging", Some(ThreatCategory::DefenseEvasion)),
        ]);
        assert_eq!(payload.summary, "3 suspicious cloudtrail events detected");
        assert_eq!(payload.findings.len(), 3);
    }

    #[test]
    fn mapping_lists_only_matched_categories() {
        let payload = build_alert_payload(vec![
            finding("CreateUser", Some(ThreatCategory::PrivilegeEscalation)),
            finding("StopLogging", Some(ThreatCategory::DefenseEvasion)),
            finding("", None),
        ]);
        let keys: Vec<_> = payload.mitre_mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Defense Evasion", "Privilege Escalation"]);
        assert_eq!(payload.mitre_mapping["Defense Evasion"], "T1562");
        assert_eq!(payload.mitre_mapping["Privilege Escalation"], "T1078 / T1098");
    }

    #[test]
    fn message_has_stable_key_order() {
        let payload = build_alert_payload(vec![finding(
            "GetObject",
            Some(ThreatCategory::DataExfiltration),
        )]);
        let message = payload.to_message().unwrap();
        let summary = message.find("\"summary\"").unwrap();
        let findings = message.find("\"findings\"").unwrap();
        let mapping = message.find("\"mitre mapping\"").unwrap();
        assert!(summary < findings && findings < mapping);
        assert!(message.contains("\"Data Exfiltration\": \"T1537 / T1041\""));
        assert_eq!(message, payload.to_message().unwrap());
    }
}
