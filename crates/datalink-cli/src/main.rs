mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    cluster::ClusterSubcommand, config::ConfigSubcommand, link::LinkSubcommand,
    provision::TargetArgs, records::RecordsSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "datalink",
    about = "Provision monitoring data links and reconcile their metadata",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .datalink/)
    #[arg(long, global = true, env = "DATALINK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log workflow progress at info level
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize .datalink/ with a config file and metadata store
    Init {
        /// Default namespace for new data links
        #[arg(long)]
        namespace: Option<String>,
        /// Business id prefixed to bkbase table ids
        #[arg(long)]
        biz_id: Option<u32>,
        /// Base URL of the provisioning API
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Manage storage clusters
    Cluster {
        #[command(subcommand)]
        subcommand: ClusterSubcommand,
    },

    /// Manage data links
    Link {
        #[command(subcommand)]
        subcommand: LinkSubcommand,
    },

    /// Compose and persist the config set for a link without submitting it
    Compose(TargetArgs),

    /// Compose configs and submit them to the provisioning API
    Apply(TargetArgs),

    /// Reconcile the tracking record with the provisioned storage
    Sync(TargetArgs),

    /// Inspect tracking records
    Records {
        #[command(subcommand)]
        subcommand: RecordsSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            namespace,
            biz_id,
            api_url,
        } => cmd::init::run(&root, namespace, biz_id, api_url, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Cluster { subcommand } => cmd::cluster::run(&root, subcommand, cli.json),
        Commands::Link { subcommand } => cmd::link::run(&root, subcommand, cli.json),
        Commands::Compose(target) => cmd::provision::compose(&root, &target, cli.json),
        Commands::Apply(target) => cmd::provision::apply(&root, &target, cli.json),
        Commands::Sync(target) => cmd::provision::sync(&root, &target, cli.json),
        Commands::Records { subcommand } => cmd::records::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
