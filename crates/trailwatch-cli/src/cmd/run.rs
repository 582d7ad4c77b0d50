use crate::output::print_json;
use crate::settings;
use anyhow::Context;
use std::num::NonZeroU32;
use std::path::Path;
use trailwatch_core::{AthenaClient, DetectionJob, SnsPublisher, ThreadSleeper};

pub fn run(config_path: Option<&Path>, lookback_minutes: Option<NonZeroU32>) -> anyhow::Result<()> {
    let cfg = settings::load(config_path, lookback_minutes)?;
    cfg.validate().context("configuration is incomplete")?;
    let catalogue = cfg.catalogue()?;

    let athena = AthenaClient::new(cfg.athena_url(), cfg.http_timeout())
        .context("failed to build Athena client")?;
    let sns = SnsPublisher::new(cfg.sns_url(), cfg.http_timeout())
        .context("failed to build SNS client")?;

    let job = DetectionJob {
        queries: &athena,
        sink: &sns,
        sleeper: &ThreadSleeper,
        config: &cfg,
        catalogue: &catalogue,
    };
    let result = job.run().context("detection run aborted")?;

    print_json(&result)?;
    if !result.is_success() {
        anyhow::bail!("detection run failed: {}", result.body);
    }
    Ok(())
}
