//! Shared Kubernetes utilities using kube-rs

use std::path::Path;
use std::time::Duration;

use k8s_openapi::api::batch::v1::JobCondition;
use k8s_openapi::api::core::v1::PodCondition;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::Error;

/// Condition status value meaning "true"
pub const STATUS_TRUE: &str = "True";

/// Default connection timeout for kube clients
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default read timeout for kube clients
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Check if a Kubernetes condition of the given type has status "True"
///
/// When a type appears more than once the last entry wins.
///
/// # Arguments
/// * `conditions` - Optional slice of conditions (e.g., from status.conditions)
/// * `condition_type` - The condition type to check (e.g., "Ready", "Initialized")
pub fn has_condition<T>(conditions: Option<&[T]>, condition_type: &str) -> bool
where
    T: HasConditionFields,
{
    conditions
        .map(|conds| {
            conds
                .iter()
                .rev()
                .find(|c| c.type_field() == condition_type)
                .is_some_and(|c| c.status_field() == STATUS_TRUE)
        })
        .unwrap_or(false)
}

/// Trait for types that have condition-like fields (type and status)
pub trait HasConditionFields {
    /// Get the condition type field value
    fn type_field(&self) -> &str;
    /// Get the condition status field value
    fn status_field(&self) -> &str;
}

impl HasConditionFields for PodCondition {
    fn type_field(&self) -> &str {
        &self.type_
    }
    fn status_field(&self) -> &str {
        &self.status
    }
}

impl HasConditionFields for JobCondition {
    fn type_field(&self) -> &str {
        &self.type_
    }
    fn status_field(&self) -> &str {
        &self.status
    }
}

/// Create a kube client from optional kubeconfig path with custom timeouts
///
/// Every store call made through the returned client is bounded by these
/// timeouts; nothing in the control-plane core waits indefinitely.
pub async fn create_client_with_timeout(
    kubeconfig: Option<&Path>,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, Error> {
    let mut config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                Error::internal_with_context(
                    "create_client",
                    format!("failed to read kubeconfig: {}", e),
                )
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    Error::internal_with_context(
                        "create_client",
                        format!("failed to load kubeconfig: {}", e),
                    )
                })?
        }
        None => Config::infer().await.map_err(|e| {
            Error::internal_with_context("create_client", format!("failed to infer config: {}", e))
        })?,
    };
    config.connect_timeout = Some(connect_timeout);
    config.read_timeout = Some(read_timeout);
    Client::try_from(config).map_err(|e| {
        Error::internal_with_context("create_client", format!("failed to create client: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod_condition(type_: &str, status: &str) -> PodCondition {
        PodCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn has_condition_requires_true_status() {
        let conds = vec![
            pod_condition("Ready", "False"),
            pod_condition("Initialized", "True"),
        ];
        assert!(has_condition(Some(conds.as_slice()), "Initialized"));
        assert!(!has_condition(Some(conds.as_slice()), "Ready"));
        assert!(!has_condition::<PodCondition>(None, "Ready"));
    }

    #[test]
    fn later_condition_entry_overrides_earlier() {
        let conds = vec![pod_condition("Ready", "True"), pod_condition("Ready", "False")];
        assert!(!has_condition(Some(conds.as_slice()), "Ready"));

        let conds = vec![pod_condition("Ready", "False"), pod_condition("Ready", "True")];
        assert!(has_condition(Some(conds.as_slice()), "Ready"));
    }
}
