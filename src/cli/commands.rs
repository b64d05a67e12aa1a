use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "moni-check")]
#[command(about = "Check wallet eligibility for the $MONI airdrop")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (extension optional)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a wallet against every configured rule
    Check {
        /// Wallet address to check
        address: String,

        /// Only evaluate this rule
        #[arg(short, long)]
        rule: Option<String>,

        /// Evaluate rules concurrently
        #[arg(long)]
        concurrent: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show raw token holdings for each rule's contract
    Balances {
        /// Wallet address to inspect
        address: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List configured eligibility rules
    Rules {
        /// Output format (table, toml)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Read wallet addresses from stdin and re-check on every change.
    /// An empty line disconnects the wallet.
    Watch,
}
