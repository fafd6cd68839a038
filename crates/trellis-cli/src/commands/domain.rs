//! `trellis domain` - domain management

use std::sync::Arc;

use clap::{Args, Subcommand};
use kube::ResourceExt;

use trellis_common::crd::Domain;
use trellis_common::store::KubeStore;
use trellis_common::TENANT_LABEL;
use trellis_tenant::DomainManager;

use super::format::{format_age, print_table};
use super::{print_json, OutputFormat, Session};
use crate::config::GlobalArgs;
use crate::Result;

/// Manage domains
#[derive(Args, Debug)]
pub struct DomainArgs {
    #[command(subcommand)]
    pub action: DomainCommand,
}

/// Domain operation
#[derive(Subcommand, Debug)]
pub enum DomainCommand {
    /// List domains visible to the caller
    List,
    /// Show one domain by object name
    Get {
        /// Domain object name
        name: String,
    },
    /// Register a domain (`app.example.com` or `*.example.com`)
    Create {
        /// Domain value
        domain: String,
    },
    /// Delete a domain by object name
    Delete {
        /// Domain object name
        name: String,
    },
}

pub async fn run(global: &GlobalArgs, args: DomainArgs) -> Result<()> {
    let session = Session::connect(global).await?;
    let manager = DomainManager::new(Arc::new(KubeStore::<Domain>::cluster(
        session.client.clone(),
    )));
    let principal = &session.principal;

    match args.action {
        DomainCommand::List => {
            let domains = manager.list(principal).await?;
            print_domains(&domains, global.output)
        }
        DomainCommand::Get { name } => {
            let domain = manager.get(principal, &name).await?;
            print_domains(std::slice::from_ref(&domain), global.output)
        }
        DomainCommand::Create { domain } => {
            let created = manager.create(principal, &domain).await?;
            print_domains(std::slice::from_ref(&created), global.output)
        }
        DomainCommand::Delete { name } => {
            manager.delete(principal, &name).await?;
            println!("Domain {} deleted.", name);
            Ok(())
        }
    }
}

fn print_domains(domains: &[Domain], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(domains),
        OutputFormat::Table => {
            if domains.is_empty() {
                println!("No domains found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = domains
                .iter()
                .map(|d| {
                    let dns = d
                        .status
                        .as_ref()
                        .map(|s| s.dns_target_configured)
                        .unwrap_or(false);
                    vec![
                        d.name_any(),
                        d.spec.domain.clone(),
                        d.labels()
                            .get(TENANT_LABEL)
                            .cloned()
                            .unwrap_or_else(|| "-".to_string()),
                        dns.to_string(),
                        d.metadata
                            .creation_timestamp
                            .as_ref()
                            .map(|t| format_age(&t.0))
                            .unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            print_table(&["NAME", "DOMAIN", "TENANT", "DNS", "AGE"], &rows);
            Ok(())
        }
    }
}
