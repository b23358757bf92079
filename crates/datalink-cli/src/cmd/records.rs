use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use datalink_core::tracking::BkBaseResultTable;
use std::path::Path;

#[derive(Subcommand)]
pub enum RecordsSubcommand {
    /// List tracking records
    List {
        /// Only records of this data link
        #[arg(long)]
        link: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: RecordsSubcommand, json: bool) -> anyhow::Result<()> {
    let (_, db) = super::open_workspace(root)?;
    match subcmd {
        RecordsSubcommand::List { link } => {
            let records: Vec<BkBaseResultTable> = db
                .list::<BkBaseResultTable>()
                .context("failed to list tracking records")?
                .into_iter()
                .filter(|r| link.as_deref().map_or(true, |l| r.data_link_name == l))
                .collect();
            if json {
                print_json(&records)?;
            } else {
                let rows = records
                    .iter()
                    .map(|r| {
                        vec![
                            r.data_link_name.clone(),
                            r.bkbase_table_id.clone(),
                            r.monitor_table_id.clone(),
                            r.storage_id.map(|id| id.to_string()).unwrap_or_default(),
                            r.status.to_string(),
                        ]
                    })
                    .collect();
                print_table(&["LINK", "BKBASE TABLE", "MONITOR TABLE", "STORAGE", "STATUS"], rows);
            }
        }
    }
    Ok(())
}
