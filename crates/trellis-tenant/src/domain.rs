//! Domain management
//!
//! Domains are content-addressed: the object name is a digest of the domain
//! value, so creating the same value twice lands on the same object and the
//! second create returns it unchanged.

use std::sync::Arc;

use kube::ResourceExt;
use tracing::{info, instrument};

use trellis_authz::{AccessRequest, AuthorizationEngine, Principal, Verb, KIND_DOMAINS};
use trellis_common::crd::{validate_dns_label, Domain};
use trellis_common::store::{get_optional, LabelSelector, ObjectStore};
use trellis_common::{Error, Result, TENANT_LABEL, WILDCARD};

const WILDCARD_PREFIX: &str = "*.";
const MAX_DOMAIN_LEN: usize = 253;

/// Validate a domain value: a plain DNS name with at least two labels, or
/// `*.` followed by one.
pub fn validate_domain(value: &str) -> Result<()> {
    let invalid = |msg: String| Error::validation_for_field("domain", "spec.domain", msg);

    if value.is_empty() {
        return Err(invalid("domain cannot be empty".to_string()));
    }
    if value.len() > MAX_DOMAIN_LEN {
        return Err(invalid(format!(
            "domain exceeds {} characters: {}",
            MAX_DOMAIN_LEN, value
        )));
    }

    let plain = value.strip_prefix(WILDCARD_PREFIX).unwrap_or(value);
    let labels: Vec<&str> = plain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid(format!(
            "domain must have at least two labels: {}",
            value
        )));
    }
    for label in labels {
        validate_dns_label(label).map_err(invalid)?;
    }
    Ok(())
}

/// Domain operations over an object store
#[derive(Clone)]
pub struct DomainManager {
    domains: Arc<dyn ObjectStore<Domain>>,
    engine: AuthorizationEngine,
}

impl DomainManager {
    /// Create a manager
    pub fn new(domains: Arc<dyn ObjectStore<Domain>>) -> Self {
        Self {
            domains,
            engine: AuthorizationEngine::new(),
        }
    }

    /// Create a domain, or return the existing one for the same value.
    ///
    /// Requires `edit` on `domains/*`. Domains created by a tenant-bound
    /// principal are labelled with its tenant.
    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn create(&self, principal: &Principal, value: &str) -> Result<Domain> {
        let request = AccessRequest::cluster(Verb::Edit, KIND_DOMAINS, WILDCARD)
            .in_tenant(principal.tenant.clone());
        self.engine.must_check(principal, &request)?;
        validate_domain(value)?;

        let name = Domain::name_for(value);
        if let Some(existing) = get_optional(self.domains.as_ref(), None, &name).await? {
            return self.existing(principal, existing);
        }

        let mut domain = Domain::for_value(value);
        if let Some(tenant) = &principal.tenant {
            domain
                .labels_mut()
                .insert(TENANT_LABEL.to_string(), tenant.clone());
        }

        match self.domains.create(&domain).await {
            Ok(created) => {
                info!(domain = %value, name = %name, "domain created");
                Ok(created)
            }
            Err(Error::AlreadyExists { .. }) => {
                let existing = self.domains.get(None, &name).await?;
                self.existing(principal, existing)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch one domain by object name; requires `view` on it
    pub async fn get(&self, principal: &Principal, name: &str) -> Result<Domain> {
        let domain = self.domains.get(None, name).await?;
        self.engine
            .must_check(principal, &AuthorizationEngine::domain_request(Verb::View, &domain))?;
        Ok(domain)
    }

    /// Domains the principal may view, ordered by name
    pub async fn list(&self, principal: &Principal) -> Result<Vec<Domain>> {
        let domains = self.domains.list(None, &LabelSelector::new()).await?;
        Ok(self.engine.filter_authorized(principal, domains, |d| {
            AuthorizationEngine::domain_request(Verb::View, d)
        }))
    }

    /// Delete a domain; requires `manage` on it
    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn delete(&self, principal: &Principal, name: &str) -> Result<()> {
        let domain = self.domains.get(None, name).await?;
        self.engine
            .must_check(principal, &AuthorizationEngine::domain_request(Verb::Manage, &domain))?;
        self.domains.delete(None, name).await?;
        info!(domain = %domain.spec.domain, name = %name, "domain deleted");
        Ok(())
    }

    /// An existing domain is returned to principals who can see it; others
    /// learn only that the value is taken.
    fn existing(&self, principal: &Principal, existing: Domain) -> Result<Domain> {
        if self.engine.can_operate_domain(principal, Verb::View, &existing) {
            Ok(existing)
        } else {
            Err(Error::already_exists("Domain", existing.name_any()))
        }
    }
}
