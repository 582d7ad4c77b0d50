use anyhow::Context;
use std::num::NonZeroU32;
use std::path::Path;
use trailwatch_core::DetectionConfig;

/// Resolve the configuration for a command.
///
/// Priority (highest first):
/// 1. Command-line flags
/// 2. Environment variables
/// 3. The `--config` file
/// 4. Built-in defaults
pub fn load(
    path: Option<&Path>,
    lookback_minutes: Option<NonZeroU32>,
) -> anyhow::Result<DetectionConfig> {
    let mut cfg = DetectionConfig::load(path).with_context(|| match path {
        Some(p) => format!("failed to load configuration from {}", p.display()),
        None => "failed to load configuration from the environment".to_string(),
    })?;
    if let Some(minutes) = lookback_minutes {
        cfg.lookback_minutes = minutes;
    }
    Ok(cfg)
}
