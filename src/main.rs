//! Piggybank CLI binary

use anyhow::Context;
use clap::Parser;
use piggybank::cli::{Cli, Commands, PiggybankApp};
use piggybank::{CoinHeader, ProtocolConfig};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ProtocolConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ProtocolConfig::default(),
    };

    match cli.command {
        Commands::Demo {
            identity,
            amount,
            key_bits,
        } => {
            if let Some(bits) = key_bits {
                config.key_bits = bits;
            }
            tracing::info!("Generating {}-bit bank key", config.key_bits);

            let app = PiggybankApp::new(config).context("starting bank")?;
            let report = app
                .run_demo(&identity, amount)
                .context("running demo")?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Parse { coin } => {
            let header = CoinHeader::parse(&coin, &config.bank_marker)
                .context("parsing coin")?;
            println!("{}", serde_json::to_string_pretty(&header)?);
        }
    }

    Ok(())
}
