//! sitepress CLI: publish a web comic from its content manifest.
//!
//! Fetches the manifest, hands the renderer a `site-data.json`, and ships
//! the rendered site to the deployer endpoint as a single bundle.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
