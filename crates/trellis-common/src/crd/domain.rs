//! Domain CRD binding a DNS name to ingress routing
//!
//! A Domain's object name is a digest of its value, so the same value always
//! lands on the same object.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::hashing::deterministic_hash;

/// Domain declares a DNS name (plain or `*.` wildcard) served by the platform.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "trellis.dev",
    version = "v1alpha1",
    kind = "Domain",
    status = "DomainStatus",
    printcolumn = r#"{"name":"Domain","type":"string","jsonPath":".spec.domain"}"#,
    printcolumn = r#"{"name":"DNS","type":"boolean","jsonPath":".status.dnsTargetConfigured"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DomainSpec {
    /// The domain value, e.g. `app.example.com` or `*.example.com`
    pub domain: String,
}

/// Domain status, written by the DNS checker
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainStatus {
    /// Whether the domain's DNS record points at the platform ingress
    #[serde(default)]
    pub dns_target_configured: bool,
}

impl Domain {
    /// Object name for a domain value
    pub fn name_for(domain: &str) -> String {
        deterministic_hash(domain)
    }

    /// Build a Domain whose name is derived from its value
    pub fn for_value(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Domain::new(&Self::name_for(&domain), DomainSpec { domain })
    }
}
