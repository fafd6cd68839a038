//! Trellis CLI library

pub mod commands;
pub mod config;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

use config::GlobalArgs;

/// Trellis - multi-tenant workload platform control plane
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the Trellis CRD definitions as YAML
    Crds,
    /// Manage tenants
    Tenant(commands::tenant::TenantArgs),
    /// Manage domains
    Domain(commands::domain::DomainArgs),
    /// Show the derived status of a component's pods and jobs
    Status(commands::status::StatusArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Crds => commands::crds::run(),
            Commands::Tenant(args) => commands::tenant::run(&self.global, args).await,
            Commands::Domain(args) => commands::domain::run(&self.global, args).await,
            Commands::Status(args) => commands::status::run(&self.global, args).await,
        }
    }
}
