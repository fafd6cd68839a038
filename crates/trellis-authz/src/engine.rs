//! Authorization engine
//!
//! Evaluates a [`Principal`]'s rules against an [`AccessRequest`]. Evaluation
//! is default-deny: an empty rule set, a malformed request, or a tenant
//! mismatch all refuse the request.
//!
//! A request's owning tenant is the one it carries, or for namespaced requests
//! the one the engine's [`TenantResolver`] reports for the namespace. Without a
//! resolver, namespaced requests have no owner and tenant-bound principals are
//! refused them.
//!
//! [`AuthorizationEngine::check`] is pure. [`AuthorizationEngine::must_check`]
//! is the gate used before mutations; it logs the decision, records the
//! decision metric and converts a denial into [`Error::PermissionDenied`].

use std::fmt;
use std::sync::Arc;

use kube::ResourceExt;
use tracing::{debug, warn};

use trellis_common::crd::{Domain, Verb};
use trellis_common::metrics::{record_authz_decision, AuthDecision};
use trellis_common::{Error, Result, TENANT_LABEL, WILDCARD};

use crate::principal::Principal;
use crate::request::{AccessRequest, Scope};
use crate::tenancy::TenantResolver;

/// Kind used for domain requests
pub const KIND_DOMAINS: &str = "domains";

/// Why a request was refused
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenialReason {
    /// Request has an empty namespace, kind or name
    MalformedRequest,
    /// Principal is bound to a tenant other than the request's
    TenantMismatch {
        /// Tenant the principal is bound to
        principal_tenant: String,
        /// Tenant owning the target, if any
        request_tenant: Option<String>,
    },
    /// No rule covers the request
    NoMatchingRule,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::MalformedRequest => write!(f, "malformed request"),
            DenialReason::TenantMismatch {
                principal_tenant,
                request_tenant,
            } => write!(
                f,
                "principal bound to tenant {} but target belongs to {}",
                principal_tenant,
                request_tenant.as_deref().unwrap_or("no tenant")
            ),
            DenialReason::NoMatchingRule => write!(f, "no matching rule"),
        }
    }
}

/// Rule evaluator with optional namespace ownership
#[derive(Clone, Default)]
pub struct AuthorizationEngine {
    tenants: Option<Arc<dyn TenantResolver>>,
}

impl fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationEngine")
            .field("resolves_tenants", &self.tenants.is_some())
            .finish()
    }
}

impl AuthorizationEngine {
    /// Engine without namespace ownership
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine resolving namespaced requests to their owning tenant
    pub fn with_tenants(tenants: Arc<dyn TenantResolver>) -> Self {
        Self {
            tenants: Some(tenants),
        }
    }

    /// Tenant owning the request's target
    pub fn owning_tenant(&self, request: &AccessRequest) -> Option<String> {
        if request.tenant.is_some() {
            return request.tenant.clone();
        }
        match (&request.scope, &self.tenants) {
            (Scope::Namespace(ns), Some(tenants)) => tenants.tenant_of(ns),
            _ => None,
        }
    }

    /// Evaluate a request, returning the reason on denial
    pub fn evaluate(
        &self,
        principal: &Principal,
        request: &AccessRequest,
    ) -> std::result::Result<(), DenialReason> {
        if !request.is_well_formed() {
            return Err(DenialReason::MalformedRequest);
        }

        if let Some(bound) = &principal.tenant {
            let owner = self.owning_tenant(request);
            if owner.as_ref() != Some(bound) {
                return Err(DenialReason::TenantMismatch {
                    principal_tenant: bound.clone(),
                    request_tenant: owner,
                });
            }
        }

        if principal.rules.iter().any(|rule| rule.permits(request)) {
            Ok(())
        } else {
            Err(DenialReason::NoMatchingRule)
        }
    }

    /// Whether the principal may perform the request
    pub fn check(&self, principal: &Principal, request: &AccessRequest) -> bool {
        self.evaluate(principal, request).is_ok()
    }

    /// Like [`check`](Self::check) but fails with [`Error::PermissionDenied`]
    pub fn must_check(&self, principal: &Principal, request: &AccessRequest) -> Result<()> {
        match self.evaluate(principal, request) {
            Ok(()) => {
                debug!(principal = %principal.name, request = %request, "authorized");
                record_authz_decision(AuthDecision::Allow, request.verb.as_str());
                Ok(())
            }
            Err(reason) => {
                if reason == DenialReason::MalformedRequest {
                    warn!(principal = %principal.name, request = %request, "malformed authorization request");
                } else {
                    debug!(principal = %principal.name, request = %request, %reason, "denied");
                }
                record_authz_decision(AuthDecision::Deny, request.verb.as_str());
                Err(Error::PermissionDenied {
                    principal: principal.name.clone(),
                    verb: request.verb.to_string(),
                    namespace: request.scope.to_string(),
                    kind: request.kind.clone(),
                    name: request.name.clone(),
                })
            }
        }
    }

    /// `view` on a namespaced object
    pub fn can_view(&self, principal: &Principal, namespace: &str, kind: &str, name: &str) -> bool {
        self.check(principal, &AccessRequest::new(Verb::View, namespace, kind, name))
    }

    /// `edit` on a namespaced object
    pub fn can_edit(&self, principal: &Principal, namespace: &str, kind: &str, name: &str) -> bool {
        self.check(principal, &AccessRequest::new(Verb::Edit, namespace, kind, name))
    }

    /// `manage` on a namespaced object
    pub fn can_manage(
        &self,
        principal: &Principal,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> bool {
        self.check(principal, &AccessRequest::new(Verb::Manage, namespace, kind, name))
    }

    /// Request for `verb` on a stored domain, owned by the domain's tenant label
    pub fn domain_request(verb: Verb, domain: &Domain) -> AccessRequest {
        AccessRequest::cluster(verb, KIND_DOMAINS, domain.name_any())
            .in_tenant(domain.labels().get(TENANT_LABEL).cloned())
    }

    /// Whether the principal may perform `verb` on a stored domain
    pub fn can_operate_domain(&self, principal: &Principal, verb: Verb, domain: &Domain) -> bool {
        self.check(principal, &Self::domain_request(verb, domain))
    }

    /// Request for `manage` over the whole cluster
    pub fn manage_cluster_request() -> AccessRequest {
        AccessRequest::cluster(Verb::Manage, WILDCARD, WILDCARD)
    }

    /// Whether the principal holds `manage` over the whole cluster
    pub fn can_manage_cluster(&self, principal: &Principal) -> bool {
        self.check(principal, &Self::manage_cluster_request())
    }

    /// Keep only the items the principal may access, preserving order
    pub fn filter_authorized<T, F>(&self, principal: &Principal, items: Vec<T>, request_for: F) -> Vec<T>
    where
        F: Fn(&T) -> AccessRequest,
    {
        items
            .into_iter()
            .filter(|item| self.check(principal, &request_for(item)))
            .collect()
    }
}
