use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use datalink_core::{types::DataLinkStrategy, DataLink};
use std::path::Path;

#[derive(Subcommand)]
pub enum LinkSubcommand {
    /// Create a data link (no-op if it already exists with the same strategy)
    Create {
        name: String,
        #[arg(long, default_value = "bk_standard_v2_time_series")]
        strategy: DataLinkStrategy,
        /// Namespace (default: from config)
        #[arg(long)]
        namespace: Option<String>,
    },
    /// List data links
    List,
    /// Show a data link and its local resources
    Show { name: String },
}

pub fn run(root: &Path, subcmd: LinkSubcommand, json: bool) -> anyhow::Result<()> {
    let (settings, db) = super::open_workspace(root)?;
    match subcmd {
        LinkSubcommand::Create {
            name,
            strategy,
            namespace,
        } => {
            let namespace = namespace.unwrap_or_else(|| settings.namespace.clone());
            let link = DataLink::create(&db, &name, &namespace, strategy)
                .with_context(|| format!("failed to create data link '{name}'"))?;
            if json {
                print_json(&link)?;
            } else {
                println!(
                    "Data link '{}' ({}) in namespace '{}'",
                    link.data_link_name, link.data_link_strategy, link.namespace
                );
            }
        }
        LinkSubcommand::List => {
            let links = DataLink::list(&db).context("failed to list data links")?;
            if json {
                print_json(&links)?;
            } else {
                let rows = links
                    .iter()
                    .map(|l| {
                        vec![
                            l.data_link_name.clone(),
                            l.namespace.clone(),
                            l.data_link_strategy.to_string(),
                            l.create_time.format("%Y-%m-%d %H:%M").to_string(),
                        ]
                    })
                    .collect();
                print_table(&["NAME", "NAMESPACE", "STRATEGY", "CREATED"], rows);
            }
        }
        LinkSubcommand::Show { name } => {
            let link = DataLink::load(&db, &name)
                .with_context(|| format!("data link '{name}' not found"))?;
            let resources = link
                .resources(&db)
                .context("failed to read link resources")?;
            if json {
                print_json(&serde_json::json!({ "link": link, "resources": resources }))?;
            } else {
                println!("Data link: {}", link.data_link_name);
                println!("Namespace: {}", link.namespace);
                println!("Strategy:  {}", link.data_link_strategy);
                println!();
                let mut rows = Vec::new();
                for r in &resources.result_tables {
                    rows.push(vec!["ResultTable".to_string(), r.name.clone(), r.status.to_string()]);
                }
                for r in &resources.storage_bindings {
                    rows.push(vec![
                        "VmStorageBinding".to_string(),
                        format!("{} -> {}", r.name, r.vm_cluster_name),
                        r.status.to_string(),
                    ]);
                }
                for r in &resources.databuses {
                    rows.push(vec![
                        "Databus".to_string(),
                        format!("{} <- {}", r.name, r.data_id_name),
                        r.status.to_string(),
                    ]);
                }
                for r in &resources.tracking {
                    rows.push(vec![
                        "Tracking".to_string(),
                        r.bkbase_table_id.clone(),
                        r.status.to_string(),
                    ]);
                }
                print_table(&["KIND", "NAME", "STATUS"], rows);
            }
        }
    }
    Ok(())
}
