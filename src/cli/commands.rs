//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "piggybank")]
#[command(about = "Piggybank - offline anonymous e-cash with double-spend tracing", long_about = None)]
pub struct Cli {
    /// Protocol configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mint one coin, spend it twice and let the bank trace it
    Demo {
        /// Identity embedded in the coin
        #[arg(short, long, default_value = "alice")]
        identity: String,

        /// Coin denomination
        #[arg(short, long, default_value = "20")]
        amount: u64,

        /// Override the bank key size
        #[arg(short, long)]
        key_bits: Option<usize>,
    },

    /// Print the effective configuration as JSON
    Config,

    /// Parse a canonical coin string
    Parse {
        /// Coin string as deposited
        coin: String,
    },
}
