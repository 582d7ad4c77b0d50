use crate::output::print_json;
use crate::settings;
use std::num::NonZeroU32;
use std::path::Path;
use trailwatch_core::build_detection_query;

pub fn run(
    config_path: Option<&Path>,
    lookback_minutes: Option<NonZeroU32>,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = settings::load(config_path, lookback_minutes)?;
    cfg.validate_query()?;
    let catalogue = cfg.catalogue()?;

    let sql = build_detection_query(cfg.lookback_minutes, &catalogue, &cfg.table);

    if json {
        print_json(&serde_json::json!({
            "lookback_minutes": cfg.lookback_minutes.get(),
            "table": cfg.table,
            "actions": catalogue.len(),
            "query": sql,
        }))?;
    } else {
        println!("{sql}");
    }
    Ok(())
}
