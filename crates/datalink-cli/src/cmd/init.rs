use crate::output::print_json;
use anyhow::Context;
use datalink_core::{config::Settings, io, paths, store::MetadataDb};
use std::path::Path;

pub fn run(
    root: &Path,
    namespace: Option<String>,
    biz_id: Option<u32>,
    api_url: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    io::ensure_datalink_dir(root).with_context(|| {
        format!("failed to create {}", paths::datalink_dir(root).display())
    })?;

    let config_path = paths::config_path(root);
    let config_created = !config_path.exists();
    if config_created {
        let mut settings = Settings::default();
        if let Some(ns) = namespace {
            settings.namespace = ns;
        }
        if let Some(id) = biz_id {
            settings.bkdata_biz_id = id;
        }
        if let Some(url) = api_url {
            settings.api.base_url = url;
        }
        settings
            .save(root)
            .context("failed to write config.yaml")?;
    }

    let db_path = paths::metadata_db_path(root);
    let db_created = !db_path.exists();
    MetadataDb::open(&db_path).context("failed to create metadata store")?;

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config_created": config_created,
            "db_created": db_created,
        }))?;
    } else {
        println!("Initializing datalink in: {}", root.display());
        let status = |created: bool| if created { "created:" } else { "exists: " };
        println!("  {} {}", status(config_created), paths::CONFIG_FILE);
        println!("  {} {}", status(db_created), paths::METADATA_DB_FILE);
    }
    Ok(())
}
