//! Namespace ownership used to confine tenant-bound principals

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;

use trellis_common::TENANT_LABEL;

/// Maps a namespace to the tenant that owns it
pub trait TenantResolver: Send + Sync {
    /// Owning tenant of `namespace`, if any
    fn tenant_of(&self, namespace: &str) -> Option<String>;
}

/// Snapshot of namespace ownership taken from `trellis.dev/tenant` labels
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceTenants {
    owners: BTreeMap<String, String>,
}

impl NamespaceTenants {
    /// Empty snapshot; no namespace has an owner
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `namespace` belongs to `tenant`
    pub fn with(mut self, namespace: impl Into<String>, tenant: impl Into<String>) -> Self {
        self.owners.insert(namespace.into(), tenant.into());
        self
    }

    /// Build from namespace objects; unlabeled namespaces stay unowned
    pub fn from_namespaces<'a>(namespaces: impl IntoIterator<Item = &'a Namespace>) -> Self {
        let owners = namespaces
            .into_iter()
            .filter_map(|ns| {
                ns.labels()
                    .get(TENANT_LABEL)
                    .map(|tenant| (ns.name_any(), tenant.clone()))
            })
            .collect();
        Self { owners }
    }
}

impl TenantResolver for NamespaceTenants {
    fn tenant_of(&self, namespace: &str) -> Option<String> {
        self.owners.get(namespace).cloned()
    }
}
