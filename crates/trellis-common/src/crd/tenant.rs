//! Tenant CRD for isolated customer environments
//!
//! A Tenant groups the namespaces and resources of one customer on the shared
//! cluster. Its lifecycle phase lives in status and is driven by the tenant
//! manager, never by users editing status directly.

use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tenant defines an isolated environment on the shared cluster.
///
/// Example:
/// ```yaml
/// apiVersion: trellis.dev/v1alpha1
/// kind: Tenant
/// metadata:
///   name: acme
/// spec:
///   displayName: ACME Corp
///   plan: standard
///   owners:
///     - ops@acme.example
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "trellis.dev",
    version = "v1alpha1",
    kind = "Tenant",
    status = "TenantStatus",
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Plan","type":"string","jsonPath":".spec.plan"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TenantSpec {
    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Billing plan identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    /// Contact identities for the tenant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

/// Tenant status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TenantStatus {
    /// Current lifecycle phase
    #[serde(default)]
    pub phase: TenantPhase,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC 3339 time of the last phase change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Tenant lifecycle phase
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum TenantPhase {
    /// Workloads are scheduled normally
    #[default]
    Active,
    /// Scheduled compute is suspended; reversible
    Paused,
    /// Tenant is being torn down; terminal
    Deleting,
}

impl fmt::Display for TenantPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantPhase::Active => write!(f, "Active"),
            TenantPhase::Paused => write!(f, "Paused"),
            TenantPhase::Deleting => write!(f, "Deleting"),
        }
    }
}

impl Tenant {
    /// Current phase; a tenant without status is Active
    pub fn phase(&self) -> TenantPhase {
        self.status.as_ref().map(|s| s.phase).unwrap_or_default()
    }
}
