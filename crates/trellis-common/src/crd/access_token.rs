//! AccessToken CRD for bearer-token credentials
//!
//! An AccessToken is named by the SHA-256 hex digest of its secret. The
//! secret itself is never written to the cluster: possession of the plaintext
//! is proven by hashing it and finding the object.

use std::fmt;
use std::str::FromStr;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// AccessToken grants a fixed set of rules to whoever holds the secret.
///
/// Example:
/// ```yaml
/// apiVersion: trellis.dev/v1alpha1
/// kind: AccessToken
/// metadata:
///   name: 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
///   labels:
///     trellis.dev/tenant: acme
/// spec:
///   creator: admin@example.com
///   createdAt: "2026-01-01T00:00:00Z"
///   rules:
///     - verb: manage
///       namespace: "*"
///       kind: "*"
///       name: "*"
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "trellis.dev",
    version = "v1alpha1",
    kind = "AccessToken",
    printcolumn = r#"{"name":"Creator","type":"string","jsonPath":".spec.creator"}"#,
    printcolumn = r#"{"name":"Expires","type":"string","jsonPath":".spec.expiredAt"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenSpec {
    /// Ordered capability grants
    pub rules: Vec<AccessTokenRule>,

    /// Identity of the principal that minted this token
    pub creator: String,

    /// RFC 3339 creation time
    pub created_at: String,

    /// RFC 3339 expiry; `None` never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<String>,
}

/// A single `(verb, namespace, kind, name)` grant; any field may be `*`
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenRule {
    /// Highest verb granted
    pub verb: Verb,
    /// Namespace or `*`
    pub namespace: String,
    /// Resource kind (e.g. "domains") or `*`
    pub kind: String,
    /// Object name or `*`
    pub name: String,
}

/// Access verb. Ordering is the privilege hierarchy: `View < Edit < Manage`.
#[derive(
    Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Read access
    View,
    /// Read and write access
    Edit,
    /// Full control, including deletion and lifecycle operations
    Manage,
}

impl Verb {
    /// All verbs, lowest privilege first
    pub const ALL: [Verb; 3] = [Verb::View, Verb::Edit, Verb::Manage];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::View => "view",
            Verb::Edit => "edit",
            Verb::Manage => "manage",
        }
    }

    /// Whether holding `self` implies `requested`
    pub fn implies(self, requested: Verb) -> bool {
        self >= requested
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Verb::View),
            "edit" => Ok(Verb::Edit),
            "manage" => Ok(Verb::Manage),
            other => Err(format!("unknown verb: {}", other)),
        }
    }
}
