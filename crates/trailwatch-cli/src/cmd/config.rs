use crate::output::print_json;
use crate::settings;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the configuration after file, environment and defaults are merged
    Show,

    /// Check that a detection run has everything it needs
    Validate,
}

pub fn run(config_path: Option<&Path>, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = settings::load(config_path, None)?;
    match subcmd {
        ConfigSubcommand::Show => {
            if json {
                print_json(&cfg)
            } else {
                print!("{}", serde_yaml::to_string(&cfg)?);
                Ok(())
            }
        }
        ConfigSubcommand::Validate => {
            cfg.validate()?;
            if json {
                print_json(&serde_json::json!({ "valid": true }))
            } else {
                println!("configuration is valid");
                Ok(())
            }
        }
    }
}
