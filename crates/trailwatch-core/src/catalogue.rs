//! The catalogue of CloudTrail action names the detection query looks for.
//!
//! Each action belongs to exactly one [`ThreatCategory`], which in turn carries
//! the MITRE ATT&CK technique IDs reported in alerts.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{Result, TrailwatchError};

// ---------------------------------------------------------------------------
// ThreatCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    PrivilegeEscalation,
    DataExfiltration,
    DefenseEvasion,
}

impl ThreatCategory {
    pub fn all() -> &'static [ThreatCategory] {
        &[
            ThreatCategory::PrivilegeEscalation,
            ThreatCategory::DataExfiltration,
            ThreatCategory::DefenseEvasion,
        ]
    }

    /// Human-readable label used as the key of the alert's technique mapping.
    pub fn label(&self) -> &'static str {
        match self {
            ThreatCategory::PrivilegeEscalation => "Privilege Escalation",
            ThreatCategory::DataExfiltration => "Data Exfiltration",
            ThreatCategory::DefenseEvasion => "Defense Evasion",
        }
    }

    /// MITRE ATT&CK technique IDs, as shown to alert recipients.
    pub fn techniques(&self) -> &'static str {
        match self {
            ThreatCategory::PrivilegeEscalation => "T1078 / T1098",
            ThreatCategory::DataExfiltration => "T1537 / T1041",
            ThreatCategory::DefenseEvasion => "T1562",
        }
    }
}

// ---------------------------------------------------------------------------
// ActionCatalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub action: String,
    pub category: ThreatCategory,
}

/// Ordered, duplicate-free set of action names. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalogue {
    entries: Vec<CatalogueEntry>,
}

const PRIVILEGE_ESCALATION: &[&str] = &[
    "CreateUser",
    "AttachUserPolicy",
    "PutUserPolicy",
    "AddUserToGroup",
    "CreateAccessKey",
    "UpdateAssumeRolePolicy",
];

const DATA_EXFILTRATION: &[&str] = &[
    "GetObject",
    "GetBucketAcl",
    "GetBucketPolicy",
    "ListBuckets",
    "GetParameter",
];

const DEFENSE_EVASION: &[&str] = &["StopLogging", "DeleteTrail", "UpdateTrail", "PutBucketPolicy"];

impl ActionCatalogue {
    /// Build a catalogue, rejecting empty or repeated action names.
    pub fn new(entries: Vec<CatalogueEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(TrailwatchError::InvalidConfig(
                "action catalogue is empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.action.trim().is_empty() {
                return Err(TrailwatchError::InvalidConfig(
                    "action catalogue contains an empty action name".into(),
                ));
            }
            if !seen.insert(entry.action.as_str()) {
                return Err(TrailwatchError::InvalidConfig(format!(
                    "action '{}' appears more than once in the catalogue",
                    entry.action
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Build a catalogue from per-category action lists, in category order.
    pub fn from_groups(groups: &BTreeMap<ThreatCategory, Vec<String>>) -> Result<Self> {
        let entries = groups
            .iter()
            .flat_map(|(category, actions)| {
                actions.iter().map(move |action| CatalogueEntry {
                    action: action.clone(),
                    category: *category,
                })
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.action.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Category of `action`; matching is case-sensitive.
    pub fn category_of(&self, action: &str) -> Option<ThreatCategory> {
        self.entries
            .iter()
            .find(|e| e.action == action)
            .map(|e| e.category)
    }
}

impl Default for ActionCatalogue {
    fn default() -> Self {
        let groups = [
            (ThreatCategory::PrivilegeEscalation, PRIVILEGE_ESCALATION),
            (ThreatCategory::DataExfiltration, DATA_EXFILTRATION),
            (ThreatCategory::DefenseEvasion, DEFENSE_EVASION),
        ];
        let entries = groups
            .iter()
            .flat_map(|(category, actions)| {
                actions.iter().map(move |action| CatalogueEntry {
                    action: (*action).to_string(),
                    category: *category,
                })
            })
            .collect();
        Self { entries }
    }
}
