use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use crate::athena::QueryTarget;
use crate::catalogue::{ActionCatalogue, ThreatCategory};
use crate::error::{Result, TrailwatchError};
use crate::poller::PollPolicy;
use crate::query::{self, DEFAULT_TABLE};

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

pub const ENV_DATABASE: &str = "ATHENA_DB_NAME";
pub const ENV_WORKGROUP: &str = "ATHENA_WORKGROUP";
pub const ENV_TOPIC_ARN: &str = "SNS_TOPIC_ARN";
pub const ENV_TABLE: &str = "ATHENA_TABLE";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ATHENA_ENDPOINT: &str = "ATHENA_ENDPOINT";
pub const ENV_SNS_ENDPOINT: &str = "SNS_ENDPOINT";
pub const ENV_LOOKBACK_MINUTES: &str = "LOOKBACK_MINUTES";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL_SECONDS";
pub const ENV_MAX_WAIT: &str = "MAX_WAIT_SECONDS";
pub const ENV_HTTP_TIMEOUT: &str = "HTTP_TIMEOUT_SECONDS";

// ---------------------------------------------------------------------------
// DetectionConfig
// ---------------------------------------------------------------------------

/// Everything one detection run needs from its environment.
///
/// Loaded from an optional YAML file, then overridden field by field from the
/// process environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub workgroup: String,
    #[serde(default)]
    pub topic_arn: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athena_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sns_endpoint: Option<String>,
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: NonZeroU32,
    /// `0` polls back to back; `max_wait_secs` still bounds the loop.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// `0` disables the limit.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// Per-category action names replacing the built-in catalogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<BTreeMap<ThreatCategory, Vec<String>>>,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_lookback_minutes() -> NonZeroU32 {
    NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN)
}

fn default_poll_interval() -> u64 {
    3
}

fn default_max_wait() -> u64 {
    300
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            workgroup: String::new(),
            topic_arn: String::new(),
            table: default_table(),
            region: default_region(),
            athena_endpoint: None,
            sns_endpoint: None,
            lookback_minutes: default_lookback_minutes(),
            poll_interval_secs: default_poll_interval(),
            max_wait_secs: default_max_wait(),
            http_timeout_secs: default_http_timeout(),
            actions: None,
        }
    }
}

impl DetectionConfig {
    /// Read `path` (or start from defaults) and apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: DetectionConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Override fields from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_DATABASE) {
            self.database = v;
        }
        if let Some(v) = get(ENV_WORKGROUP) {
            self.workgroup = v;
        }
        if let Some(v) = get(ENV_TOPIC_ARN) {
            self.topic_arn = v;
        }
        if let Some(v) = get(ENV_TABLE) {
            self.table = v;
        }
        if let Some(v) = get(ENV_REGION) {
            self.region = v;
        }
        if let Some(v) = get(ENV_ATHENA_ENDPOINT) {
            self.athena_endpoint = Some(v);
        }
        if let Some(v) = get(ENV_SNS_ENDPOINT) {
            self.sns_endpoint = Some(v);
        }
        if let Some(v) = get(ENV_LOOKBACK_MINUTES) {
            self.lookback_minutes = parse_env(ENV_LOOKBACK_MINUTES, &v)?;
        }
        if let Some(v) = get(ENV_POLL_INTERVAL) {
            self.poll_interval_secs = parse_env(ENV_POLL_INTERVAL, &v)?;
        }
        if let Some(v) = get(ENV_MAX_WAIT) {
            self.max_wait_secs = parse_env(ENV_MAX_WAIT, &v)?;
        }
        if let Some(v) = get(ENV_HTTP_TIMEOUT) {
            self.http_timeout_secs = parse_env(ENV_HTTP_TIMEOUT, &v)?;
        }
        Ok(())
    }

    /// Check everything a run needs. Settings that only shape the query
    /// (table, lookback, catalogue) are checked by [`Self::validate_query`].
    pub fn validate(&self) -> Result<()> {
        let required = [
            (ENV_DATABASE, &self.database),
            (ENV_WORKGROUP, &self.workgroup),
            (ENV_TOPIC_ARN, &self.topic_arn),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(TrailwatchError::MissingConfig(missing.join(", ")));
        }
        if self.http_timeout_secs == 0 {
            return Err(TrailwatchError::InvalidConfig(
                "http_timeout_secs must be greater than zero".into(),
            ));
        }
        self.validate_query()
    }

    pub fn validate_query(&self) -> Result<()> {
        if !query::is_valid_table_name(&self.table) {
            return Err(TrailwatchError::InvalidConfig(format!(
                "table '{}' is not a valid identifier",
                self.table
            )));
        }
        self.catalogue().map(|_| ())
    }

    pub fn catalogue(&self) -> Result<ActionCatalogue> {
        match &self.actions {
            Some(groups) => ActionCatalogue::from_groups(groups),
            None => Ok(ActionCatalogue::default()),
        }
    }

    pub fn target(&self) -> QueryTarget {
        QueryTarget {
            database: self.database.clone(),
            workgroup: self.workgroup.clone(),
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs)),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn athena_url(&self) -> String {
        self.athena_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://athena.{}.amazonaws.com", self.region))
    }

    pub fn sns_url(&self) -> String {
        self.sns_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://sns.{}.amazonaws.com", self.region))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        TrailwatchError::InvalidConfig(format!("{key}='{value}' is not a valid value"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
