use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use datalink_core::{
    provisioner::HttpProvisioner, types::DataSource, DataLink, Provisioning, SyncOutcome,
};
use std::path::Path;

/// Identifies one link invocation: which link, fed by which source, into which table and cluster.
#[derive(Args)]
pub struct TargetArgs {
    /// Data link name
    pub link: String,
    /// Data id of the source
    #[arg(long)]
    pub data_id: u32,
    /// Data name of the source
    #[arg(long)]
    pub data_name: String,
    /// Monitor-side result table id (e.g. 2_bkmonitor_time_series_1500001.__default__)
    #[arg(long)]
    pub table_id: String,
    /// Storage cluster name
    #[arg(long)]
    pub cluster: String,
}

impl TargetArgs {
    fn data_source(&self) -> DataSource {
        DataSource::new(self.data_id, &self.data_name)
    }
}

pub fn compose(root: &Path, target: &TargetArgs, json: bool) -> anyhow::Result<()> {
    let (settings, db) = super::open_workspace(root)?;
    let link = DataLink::load(&db, &target.link)
        .with_context(|| format!("data link '{}' not found", target.link))?;
    let configs = link
        .compose_configs(
            &db,
            &settings,
            &target.data_source(),
            &target.table_id,
            &target.cluster,
        )
        .context("failed to compose configs")?;

    if json {
        print_json(&configs)?;
    } else {
        for c in &configs {
            println!("{:<18} {}/{}", c.kind().to_string(), c.namespace(), c.name());
        }
    }
    Ok(())
}

pub fn apply(root: &Path, target: &TargetArgs, json: bool) -> anyhow::Result<()> {
    let (settings, db) = super::open_workspace(root)?;
    let link = DataLink::load(&db, &target.link)
        .with_context(|| format!("data link '{}' not found", target.link))?;
    let provisioner =
        HttpProvisioner::new(&settings.api).context("failed to build provisioning client")?;
    let ctx = Provisioning::new(&db, &settings, &provisioner);

    let response = link
        .apply_data_link(&ctx, &target.data_source(), &target.table_id, &target.cluster)
        .with_context(|| format!("failed to apply data link '{}'", target.link))?;

    if json {
        print_json(&serde_json::json!({ "link": target.link, "response": response }))?;
    } else {
        println!("Applied data link '{}'", target.link);
        println!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

pub fn sync(root: &Path, target: &TargetArgs, json: bool) -> anyhow::Result<()> {
    let (settings, db) = super::open_workspace(root)?;
    let link = DataLink::load(&db, &target.link)
        .with_context(|| format!("data link '{}' not found", target.link))?;
    let provisioner =
        HttpProvisioner::new(&settings.api).context("failed to build provisioning client")?;
    let ctx = Provisioning::new(&db, &settings, &provisioner);

    let outcome = link.sync_metadata(&ctx, &target.data_source(), &target.table_id, &target.cluster);

    if json {
        print_json(&outcome)?;
    } else {
        match &outcome {
            SyncOutcome::Synced { record, created } => {
                let verb = if *created { "Created" } else { "Updated" };
                println!(
                    "{verb} tracking record {} (storage {})",
                    record.bkbase_table_id,
                    record
                        .storage_id
                        .map(|id| id.to_string())
                        .unwrap_or_default()
                );
            }
            SyncOutcome::SkippedClusterNotFound { cluster_name } => {
                println!("Skipped: storage cluster '{cluster_name}' not found");
            }
            SyncOutcome::Failed { reason } => {
                println!("Sync failed: {reason}");
            }
        }
    }
    Ok(())
}
