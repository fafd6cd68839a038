//! `trellis status` - derived status of one component

use std::sync::Arc;

use clap::Args;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Namespace, Pod};

use trellis_authz::{AccessRequest, AuthorizationEngine, NamespaceTenants, Verb};
use trellis_common::store::{get_optional, KubeStore};
use trellis_status::{ComponentStatus, ComponentStatusCollector, NoMetrics, WorkloadKind};

use super::format::{format_age_millis, print_table};
use super::{print_json, OutputFormat, Session};
use crate::config::GlobalArgs;
use crate::Result;

/// Show the derived status of a component
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Namespace the component runs in
    #[arg(short, long)]
    pub namespace: String,

    /// Component name (value of the `trellis.dev/component` label)
    #[arg(short, long)]
    pub component: String,

    /// Workload kind: server, cronjob, daemonset or statefulset
    #[arg(short, long, default_value = "server", value_parser = parse_kind)]
    pub kind: WorkloadKind,
}

fn parse_kind(s: &str) -> std::result::Result<WorkloadKind, String> {
    s.parse()
}

pub async fn run(global: &GlobalArgs, args: StatusArgs) -> Result<()> {
    let session = Session::connect(global).await?;
    let client = session.client.clone();

    let namespaces = KubeStore::<Namespace>::cluster(client.clone());
    let namespace = get_optional::<Namespace, _>(&namespaces, None, &args.namespace).await?;
    let engine = AuthorizationEngine::with_tenants(Arc::new(NamespaceTenants::from_namespaces(
        namespace.iter(),
    )));
    let request = AccessRequest::namespaced(Verb::View, &args.namespace, "pods", "*");
    engine.must_check(&session.principal, &request)?;

    let collector = ComponentStatusCollector::new(
        Arc::new(KubeStore::<Pod>::namespaced(client.clone())),
        Arc::new(KubeStore::<Event>::namespaced(client.clone())),
        Arc::new(KubeStore::<Job>::namespaced(client)),
        Arc::new(NoMetrics),
    );
    let status = collector
        .collect(&args.namespace, &args.component, args.kind)
        .await?;

    match global.output {
        OutputFormat::Json => print_json(&status),
        OutputFormat::Table => {
            print_status(&status);
            Ok(())
        }
    }
}

fn print_status(status: &ComponentStatus) {
    if status.pods.is_empty() && status.jobs.is_empty() {
        println!(
            "No pods found for component {} in namespace {}.",
            status.name, status.namespace
        );
        return;
    }

    let rows: Vec<Vec<String>> = status
        .pods
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                p.status.to_string(),
                p.status_text.clone(),
                p.restarts.to_string(),
                if p.node.is_empty() { "-".to_string() } else { p.node.clone() },
                format_age_millis(p.creation_timestamp),
            ]
        })
        .collect();
    print_table(&["POD", "STATUS", "DETAIL", "RESTARTS", "NODE", "AGE"], &rows);

    for pod in status.pods.iter().filter(|p| !p.warnings.is_empty()) {
        println!();
        println!("Warnings for {}:", pod.name);
        for event in &pod.warnings {
            println!(
                "  {}: {}",
                event.reason.as_deref().unwrap_or("-"),
                event.message.as_deref().unwrap_or("")
            );
        }
    }

    if !status.jobs.is_empty() {
        println!();
        let rows: Vec<Vec<String>> = status
            .jobs
            .iter()
            .map(|j| {
                vec![
                    j.name.clone(),
                    j.phase.to_string(),
                    j.active.to_string(),
                    j.succeeded.to_string(),
                    j.failed.to_string(),
                    format_age_millis(j.creation_timestamp),
                ]
            })
            .collect();
        print_table(&["JOB", "PHASE", "ACTIVE", "SUCCEEDED", "FAILED", "AGE"], &rows);
    }
}
