use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use datalink_core::{cluster::ClusterInfo, types::StorageType};
use std::path::Path;

#[derive(Subcommand)]
pub enum ClusterSubcommand {
    /// Register a storage cluster
    Add {
        name: String,
        /// Cluster id assigned by the storage registry
        #[arg(long)]
        id: u32,
        /// Storage type
        #[arg(long = "type", default_value = "victoria_metrics")]
        cluster_type: StorageType,
    },
    /// List registered clusters
    List,
}

pub fn run(root: &Path, subcmd: ClusterSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, db) = super::open_workspace(root)?;
    match subcmd {
        ClusterSubcommand::Add {
            name,
            id,
            cluster_type,
        } => {
            let cluster = db
                .register_cluster(ClusterInfo::new(id, &name, cluster_type))
                .with_context(|| format!("failed to register cluster '{name}'"))?;
            if json {
                print_json(&cluster)?;
            } else {
                println!("Registered cluster '{}' (id {})", cluster.cluster_name, cluster.cluster_id);
            }
        }
        ClusterSubcommand::List => {
            let clusters = db.clusters().context("failed to list clusters")?;
            if json {
                print_json(&clusters)?;
            } else {
                let rows = clusters
                    .iter()
                    .map(|c| {
                        vec![
                            c.cluster_name.clone(),
                            c.cluster_id.to_string(),
                            c.cluster_type.to_string(),
                        ]
                    })
                    .collect();
                print_table(&["NAME", "ID", "TYPE"], rows);
            }
        }
    }
    Ok(())
}
