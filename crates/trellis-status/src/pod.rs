//! Pod status derivation
//!
//! A pod's observed state is reduced to one of four [`DerivedPhase`]s plus a
//! status text for display. Text is chosen by walking containers and taking
//! the first rule in an ordered rule table that matches:
//!
//! ```text
//! init containers (declared order, first not-yet-successful one wins)
//!   terminated, reason set       "Init terminated: <reason>"
//!   terminated, no reason        "Init terminated: Signal:<n>" | "Init terminated: ExitCode:<n>"
//!   waiting, reason set          "Init waiting: <reason>"   (except PodInitializing)
//!   anything else                "Init: <index>/<total>"
//! regular containers (only when no init container is pending; lowest index wins)
//!   waiting, reason set          "Waiting: <reason>"
//!   terminated, reason set       "Terminated: <reason>"
//!   terminated, no reason        "Terminated: Signal:<n>" | "Terminated: ExitCode:<n>"
//! otherwise                      the raw pod phase
//! ```

use std::fmt;

use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateTerminated, ContainerStatus as ObservedContainer, Event, Pod,
};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};

use trellis_common::kube_utils::has_condition;

use crate::events::{is_ready_or_succeeded, warnings_for_pod};
use crate::metrics_source::MetricHistories;
use crate::workload::WorkloadKind;

const REASON_POD_INITIALIZING: &str = "PodInitializing";
const REASON_COMPLETED: &str = "Completed";
const CONDITION_READY: &str = "Ready";
const CONDITION_INITIALIZED: &str = "Initialized";
const UNKNOWN_PHASE: &str = "Unknown";

/// Canonical health of a pod or job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivedPhase {
    /// Not yet running, or stuck without a warning
    Pending,
    /// Initialized, ready and running
    Running,
    /// Ran to completion
    Succeeded,
    /// Failed, or pending with warnings
    Failed,
}

impl DerivedPhase {
    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedPhase::Pending => "Pending",
            DerivedPhase::Running => "Running",
            DerivedPhase::Succeeded => "Succeeded",
            DerivedPhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for DerivedPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-container summary in declared order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    /// Container name
    pub name: String,
    /// Restarts reported for this container
    pub restart_count: i32,
    /// Whether the container passes its readiness probe
    pub ready: bool,
    /// Whether the container has started
    pub started: bool,
}

/// Display-ready status of one pod
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    /// Pod name
    pub name: String,
    /// Node the pod is scheduled on
    pub node: String,
    /// Derived phase
    pub status: DerivedPhase,
    /// Raw phase reported by the cluster
    pub phase: String,
    /// Short human-readable state
    pub status_text: String,
    /// Restarts summed over the containers considered
    pub restarts: i32,
    /// Deletion has been requested
    pub is_terminating: bool,
    /// Pod IPs
    #[serde(rename = "podIps")]
    pub pod_ips: Vec<String>,
    /// Host IP
    #[serde(rename = "hostIp")]
    pub host_ip: String,
    /// Creation time in epoch milliseconds, 0 if unknown
    pub creation_timestamp: i64,
    /// Same instant as `creation_timestamp`, under the key dashboards read
    #[serde(default)]
    pub create_timestamp: i64,
    /// Start time in epoch milliseconds, 0 if unknown
    pub start_timestamp: i64,
    /// Regular containers; empty while initializing
    pub containers: Vec<ContainerSummary>,
    /// Usage histories, filled by the collector
    pub metrics: MetricHistories,
    /// Warning events correlated to this pod
    pub warnings: Vec<Event>,
}

type TextRule = fn(&ContainerState) -> Option<String>;

const INIT_TEXT_RULES: &[TextRule] = &[init_terminated, init_terminated_code, init_waiting];

const CONTAINER_TEXT_RULES: &[TextRule] = &[
    container_waiting,
    container_terminated,
    container_terminated_code,
];

fn init_terminated(state: &ContainerState) -> Option<String> {
    terminated_reason(state).map(|r| format!("Init terminated: {}", r))
}

fn init_terminated_code(state: &ContainerState) -> Option<String> {
    terminated_code(state).map(|c| format!("Init terminated: {}", c))
}

fn init_waiting(state: &ContainerState) -> Option<String> {
    waiting_reason(state)
        .filter(|r| *r != REASON_POD_INITIALIZING)
        .map(|r| format!("Init waiting: {}", r))
}

fn container_waiting(state: &ContainerState) -> Option<String> {
    waiting_reason(state).map(|r| format!("Waiting: {}", r))
}

fn container_terminated(state: &ContainerState) -> Option<String> {
    terminated_reason(state).map(|r| format!("Terminated: {}", r))
}

fn container_terminated_code(state: &ContainerState) -> Option<String> {
    terminated_code(state).map(|c| format!("Terminated: {}", c))
}

fn first_match(rules: &[TextRule], state: Option<&ContainerState>) -> Option<String> {
    let state = state?;
    rules.iter().find_map(|rule| rule(state))
}

fn waiting_reason(state: &ContainerState) -> Option<&str> {
    state
        .waiting
        .as_ref()
        .and_then(|w| w.reason.as_deref())
        .filter(|r| !r.is_empty())
}

fn terminated_reason(state: &ContainerState) -> Option<&str> {
    state
        .terminated
        .as_ref()
        .and_then(|t| t.reason.as_deref())
        .filter(|r| !r.is_empty())
}

/// `Signal:N` or `ExitCode:N` for a termination without a reason
fn terminated_code(state: &ContainerState) -> Option<String> {
    let terminated = state.terminated.as_ref()?;
    if terminated.reason.as_deref().is_some_and(|r| !r.is_empty()) {
        return None;
    }
    Some(match terminated.signal {
        Some(signal) if signal != 0 => format!("Signal:{}", signal),
        _ => format!("ExitCode:{}", terminated.exit_code),
    })
}

fn terminated(container: &ObservedContainer) -> Option<&ContainerStateTerminated> {
    container.state.as_ref().and_then(|s| s.terminated.as_ref())
}

struct ContainerPass {
    text: Option<String>,
    restarts: i32,
    initializing: bool,
    containers: Vec<ContainerSummary>,
}

fn init_pass(init: &[ObservedContainer], declared: usize) -> ContainerPass {
    let mut restarts = 0;
    for (index, container) in init.iter().enumerate() {
        restarts += container.restart_count;
        if terminated(container).is_some_and(|t| t.exit_code == 0) {
            continue;
        }
        let text = first_match(INIT_TEXT_RULES, container.state.as_ref())
            .unwrap_or_else(|| format!("Init: {}/{}", index, declared));
        return ContainerPass {
            text: Some(text),
            restarts,
            initializing: true,
            containers: Vec::new(),
        };
    }
    ContainerPass {
        text: None,
        restarts,
        initializing: false,
        containers: Vec::new(),
    }
}

fn container_pass(containers: &[ObservedContainer]) -> ContainerPass {
    let text = containers
        .iter()
        .find_map(|c| first_match(CONTAINER_TEXT_RULES, c.state.as_ref()));
    ContainerPass {
        text,
        restarts: containers.iter().map(|c| c.restart_count).sum(),
        initializing: false,
        containers: containers
            .iter()
            .map(|c| ContainerSummary {
                name: c.name.clone(),
                restart_count: c.restart_count,
                ready: c.ready,
                started: c.started.unwrap_or(false),
            })
            .collect(),
    }
}

fn derive_phase(pod: &Pod, has_warnings: bool, kind: WorkloadKind) -> DerivedPhase {
    let status = pod.status.as_ref();
    let raw_phase = status.and_then(|s| s.phase.as_deref());
    let completed = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default()
        .iter()
        .any(|c| terminated(c).and_then(|t| t.reason.as_deref()) == Some(REASON_COMPLETED));

    if kind.is_one_shot() && completed {
        return DerivedPhase::Succeeded;
    }

    match raw_phase {
        Some("Failed") => return DerivedPhase::Failed,
        Some("Succeeded") => return DerivedPhase::Succeeded,
        _ => {}
    }

    let conditions = status.and_then(|s| s.conditions.as_deref());
    if has_condition(conditions, CONDITION_INITIALIZED)
        && has_condition(conditions, CONDITION_READY)
        && raw_phase == Some("Running")
    {
        return DerivedPhase::Running;
    }

    if has_warnings {
        return DerivedPhase::Failed;
    }

    DerivedPhase::Pending
}

/// Derive the display status of a pod.
///
/// Pure and total: any pod shape yields a status. `events` may contain
/// events for other objects; only warnings about this exact pod instance are
/// considered, and only while the pod is neither ready nor succeeded.
pub fn derive_pod_status(pod: &Pod, events: &[Event], kind: WorkloadKind) -> PodStatus {
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();
    let raw_phase = status
        .and_then(|s| s.phase.clone())
        .unwrap_or_else(|| UNKNOWN_PHASE.to_string());

    let declared_init = spec
        .and_then(|s| s.init_containers.as_ref())
        .map_or(0, Vec::len);
    let init_statuses = status
        .and_then(|s| s.init_container_statuses.as_deref())
        .unwrap_or_default();
    let container_statuses = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();

    let init = init_pass(init_statuses, declared_init);
    let pass = if init.initializing {
        init
    } else {
        container_pass(container_statuses)
    };

    let warnings = if is_ready_or_succeeded(pod) {
        Vec::new()
    } else {
        warnings_for_pod(pod, events)
    };

    let created = pod
        .metadata
        .creation_timestamp
        .as_ref()
        .map_or(0, |t| t.0.timestamp_millis());

    PodStatus {
        name: pod.name_any(),
        node: spec
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
        status: derive_phase(pod, !warnings.is_empty(), kind),
        status_text: pass.text.unwrap_or_else(|| raw_phase.clone()),
        phase: raw_phase,
        restarts: pass.restarts,
        is_terminating: pod.metadata.deletion_timestamp.is_some(),
        pod_ips: status
            .and_then(|s| s.pod_ips.as_ref())
            .map(|ips| ips.iter().map(|ip| ip.ip.clone()).collect())
            .unwrap_or_default(),
        host_ip: status.and_then(|s| s.host_ip.clone()).unwrap_or_default(),
        creation_timestamp: created,
        create_timestamp: created,
        start_timestamp: status
            .and_then(|s| s.start_time.as_ref())
            .map_or(0, |t| t.0.timestamp_millis()),
        containers: pass.containers,
        metrics: MetricHistories::default(),
        warnings,
    }
}
