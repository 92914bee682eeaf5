//! gi-verify CLI entry point.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use futures::future::join_all;
use gi_verify::{http, ChromeSessionFactory, ProductVerifier};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("gi-verify v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.to_config()?;
    let factory = ChromeSessionFactory::new(&config)?;
    let verifier = ProductVerifier::new(factory, &config)?;

    match cli.command {
        Command::Serve { .. } => {
            http::serve(verifier, config.server.listen).await?;
        }
        Command::Check { product_ids } => {
            // Submitted together; the verifier still runs them one at a time.
            let lookups = product_ids.iter().map(|id| verifier.verify(id));
            let mut failed = 0usize;
            for (id, outcome) in product_ids.iter().zip(join_all(lookups).await) {
                match outcome {
                    Ok(result) => println!("{}", serde_json::to_string(&result)?),
                    Err(e) => {
                        failed += 1;
                        warn!("{id}: {e}");
                    }
                }
            }
            if failed > 0 {
                color_eyre::eyre::bail!("{failed} of {} products could not be verified", product_ids.len());
            }
        }
    }

    info!("Goodbye!");
    Ok(())
}
