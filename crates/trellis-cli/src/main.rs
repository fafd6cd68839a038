//! Trellis CLI
//!
//! Drives tenant, domain and status operations against a cluster.

use clap::Parser;

use trellis_cli::Cli;
use trellis_common::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(cli.global.telemetry_config())?;
    cli.run().await?;
    Ok(())
}
