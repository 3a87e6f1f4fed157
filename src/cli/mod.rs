use clap::{Parser, Subcommand};

pub mod config;
pub mod demo;
pub mod duration;
pub mod version;

#[derive(Parser)]
#[command(name = "custos")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the Custos quorum authorization engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full proposal lifecycle against an in-memory ledger with
    /// development signers (no real keys, no real funds)
    Demo {
        /// Path to config file (default: ~/.local/share/custos/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Approvals required before execution (defaults to 2-of-3)
        #[arg(long, default_value_t = 2)]
        threshold: u64,

        /// Number of members in the demo registry
        #[arg(long, default_value_t = 3)]
        members: u64,

        /// Action payload carried by the proposal
        #[arg(long, default_value = "transfer 100 to demo-recipient")]
        action: String,

        /// Minimum delay before execution ("0", "30s", "48h", ...)
        #[arg(long, default_value = "0")]
        time_lock: String,

        /// Write a store snapshot here after the run
        #[arg(long)]
        snapshot: Option<String>,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Demo {
            config,
            threshold,
            members,
            action,
            time_lock,
            snapshot,
        } => demo::execute(config, threshold, members, action, time_lock, snapshot).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
