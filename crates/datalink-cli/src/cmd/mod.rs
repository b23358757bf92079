pub mod cluster;
pub mod config;
pub mod init;
pub mod link;
pub mod provision;
pub mod records;

use anyhow::Context;
use datalink_core::{config::Settings, paths, store::MetadataDb};
use std::path::Path;

/// Load settings and open the metadata store of an initialized workspace.
pub fn open_workspace(root: &Path) -> anyhow::Result<(Settings, MetadataDb)> {
    let settings = Settings::load(root).context("failed to load .datalink/config.yaml")?;
    let db = MetadataDb::open(&paths::metadata_db_path(root))
        .context("failed to open metadata store")?;
    Ok((settings, db))
}
