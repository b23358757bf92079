use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use datalink_core::config::{Settings, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (secrets masked)
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => show(settings, json),
        ConfigSubcommand::Validate => validate(&settings, json),
    }
}

fn show(mut settings: Settings, json: bool) -> anyhow::Result<()> {
    if !settings.api.app_secret.is_empty() {
        settings.api.app_secret = "********".to_string();
    }
    if json {
        print_json(&settings)?;
    } else {
        println!("namespace:     {}", settings.namespace);
        println!("bkdata_biz_id: {}", settings.bkdata_biz_id);
        println!("maintainers:   {}", settings.maintainers.join(", "));
        println!("api.base_url:  {}", settings.api.base_url);
        println!("api.app_code:  {}", settings.api.app_code);
        println!("api.username:  {}", settings.api.username);
        println!("api.timeout:   {}s", settings.api.timeout_secs);
    }
    Ok(())
}

fn validate(settings: &Settings, json: bool) -> anyhow::Result<()> {
    let warnings = settings.validate();
    if json {
        print_json(&warnings)?;
    } else if warnings.is_empty() {
        println!("Config OK");
    } else {
        for w in &warnings {
            let label = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("{label}: {}", w.message);
        }
    }
    Ok(())
}
