//! Authorization request shape

use std::fmt;

use trellis_common::crd::Verb;
use trellis_common::WILDCARD;

/// Namespace scope of a request.
///
/// Cluster-scoped resources are checked against the wildcard namespace, never
/// an empty one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Cluster-scoped resource (tenants, domains, access tokens)
    Cluster,
    /// Resource inside a concrete namespace
    Namespace(String),
}

impl Scope {
    /// Value compared against a rule's namespace field
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Cluster => WILDCARD,
            Scope::Namespace(ns) => ns,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested `(verb, namespace, kind, name)` action
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRequest {
    /// Requested verb
    pub verb: Verb,
    /// Namespace scope
    pub scope: Scope,
    /// Resource kind, e.g. "domains"
    pub kind: String,
    /// Object name, or `*` for "any object of this kind"
    pub name: String,
    /// Tenant owning the target, if any
    pub tenant: Option<String>,
}

impl AccessRequest {
    /// Request against a namespaced object
    pub fn namespaced(
        verb: Verb,
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            verb,
            scope: Scope::Namespace(namespace.into()),
            kind: kind.into(),
            name: name.into(),
            tenant: None,
        }
    }

    /// Request against a cluster-scoped object
    pub fn cluster(verb: Verb, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            verb,
            scope: Scope::Cluster,
            kind: kind.into(),
            name: name.into(),
            tenant: None,
        }
    }

    /// Build from raw fields; a namespace of `*` means cluster scope
    pub fn new(
        verb: Verb,
        namespace: &str,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        if namespace == WILDCARD {
            Self::cluster(verb, kind, name)
        } else {
            Self::namespaced(verb, namespace, kind, name)
        }
    }

    /// Attach the tenant that owns the target object
    pub fn in_tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant;
        self
    }

    /// Requests with empty fields are never authorized
    pub fn is_well_formed(&self) -> bool {
        !self.scope.as_str().is_empty() && !self.kind.is_empty() && !self.name.is_empty()
    }
}

impl fmt::Display for AccessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{}",
            self.verb, self.scope, self.kind, self.name
        )
    }
}
