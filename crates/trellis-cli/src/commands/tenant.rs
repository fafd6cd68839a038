//! `trellis tenant` - tenant lifecycle

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};

use trellis_common::crd::{AccessToken, Tenant, TenantSpec};
use trellis_common::store::KubeStore;
use trellis_tenant::{LoggingHook, TenantManager, TenantUpdate, TenantView};

use super::format::{format_age_rfc3339, print_table};
use super::{print_json, OutputFormat, Session};
use crate::config::GlobalArgs;
use crate::{Error, Result};

/// Manage tenants
#[derive(Args, Debug)]
pub struct TenantArgs {
    #[command(subcommand)]
    pub action: TenantCommand,
}

/// Tenant operation
#[derive(Subcommand, Debug)]
pub enum TenantCommand {
    /// List tenants
    List,
    /// Show one tenant
    Get {
        /// Tenant name
        name: String,
    },
    /// Create a tenant and print its access token (shown only once)
    Create {
        /// Tenant name (DNS label)
        name: String,
        /// Human-readable name
        #[arg(long)]
        display_name: Option<String>,
        /// Billing plan
        #[arg(long)]
        plan: Option<String>,
        /// Owner contact; repeatable
        #[arg(long = "owner")]
        owners: Vec<String>,
    },
    /// Replace a tenant's spec from a YAML or JSON file of `{name, spec}`
    Update {
        /// Tenant name
        name: String,
        /// File holding the update body
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Suspend a tenant's workloads
    Pause {
        /// Tenant name
        name: String,
    },
    /// Resume a paused tenant
    Resume {
        /// Tenant name
        name: String,
    },
    /// Delete a tenant and its access tokens
    Delete {
        /// Tenant name
        name: String,
    },
}

/// Parse an update body; JSON is accepted as YAML
pub fn parse_update(contents: &str) -> Result<TenantUpdate> {
    serde_yaml::from_str(contents)
        .map_err(|e| Error::validation(format!("invalid tenant update: {}", e)))
}

pub async fn run(global: &GlobalArgs, args: TenantArgs) -> Result<()> {
    let session = Session::connect(global).await?;
    let manager = TenantManager::new(
        Arc::new(KubeStore::<Tenant>::cluster(session.client.clone())),
        Arc::new(KubeStore::<AccessToken>::cluster(session.client.clone())),
        Arc::new(LoggingHook),
    );
    let principal = &session.principal;
    let output = global.output;

    match args.action {
        TenantCommand::List => {
            let tenants = manager.list(principal).await?;
            print_tenants(&tenants, output)
        }
        TenantCommand::Get { name } => {
            let tenant = manager.get(principal, &name).await?;
            print_tenants(std::slice::from_ref(&tenant), output)
        }
        TenantCommand::Create {
            name,
            display_name,
            plan,
            owners,
        } => {
            let spec = TenantSpec {
                display_name,
                plan,
                owners,
            };
            let created = manager.create(principal, &name, spec).await?;
            match output {
                OutputFormat::Json => print_json(&created),
                OutputFormat::Table => {
                    println!("Tenant {} created.", created.name);
                    if let Some(token) = &created.access_token {
                        println!();
                        println!("Access token (shown only once, store it now):");
                        println!("{}", token);
                    }
                    Ok(())
                }
            }
        }
        TenantCommand::Update { name, file } => {
            let contents = std::fs::read_to_string(&file).map_err(|e| {
                Error::command_failed(format!("failed to read {}: {}", file.display(), e))
            })?;
            let update = parse_update(&contents)?;
            let updated = manager.update(principal, &name, update).await?;
            print_tenants(std::slice::from_ref(&updated), output)
        }
        TenantCommand::Pause { name } => {
            let tenant = manager.pause(principal, &name).await?;
            print_tenants(std::slice::from_ref(&tenant), output)
        }
        TenantCommand::Resume { name } => {
            let tenant = manager.resume(principal, &name).await?;
            print_tenants(std::slice::from_ref(&tenant), output)
        }
        TenantCommand::Delete { name } => {
            manager.delete(principal, &name).await?;
            println!("Tenant {} deleted.", name);
            Ok(())
        }
    }
}

fn print_tenants(tenants: &[TenantView], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(tenants),
        OutputFormat::Table => {
            if tenants.is_empty() {
                println!("No tenants found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = tenants
                .iter()
                .map(|t| {
                    vec![
                        t.name.clone(),
                        t.phase.to_string(),
                        t.spec.display_name.clone().unwrap_or_else(|| "-".to_string()),
                        t.spec.plan.clone().unwrap_or_else(|| "-".to_string()),
                        format_age_rfc3339(t.created_at.as_deref()),
                    ]
                })
                .collect();
            print_table(&["NAME", "PHASE", "DISPLAY NAME", "PLAN", "AGE"], &rows);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_and_json_update_bodies() {
        let yaml = "name: acme\nspec:\n  plan: enterprise\n  owners: [ops@acme.example]\n";
        let update = parse_update(yaml).unwrap();
        assert_eq!(update.name, "acme");
        assert_eq!(update.spec.plan.as_deref(), Some("enterprise"));

        let json = r#"{"name": "acme", "spec": {"displayName": "ACME"}}"#;
        let update = parse_update(json).unwrap();
        assert_eq!(update.spec.display_name.as_deref(), Some("ACME"));
    }

    #[test]
    fn rejects_body_without_name() {
        assert!(matches!(
            parse_update("spec: {}\n"),
            Err(Error::Validation { .. })
        ));
    }
}
