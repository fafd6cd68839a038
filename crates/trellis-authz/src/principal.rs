//! Authenticated identities and their granted rules

use kube::ResourceExt;

use trellis_common::crd::AccessToken;
use trellis_common::TENANT_LABEL;

use crate::rule::Rule;

/// An authenticated identity with an ordered rule set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Identity used in logs and denial messages
    pub name: String,
    /// Tenant this principal is confined to, if any
    pub tenant: Option<String>,
    /// Granted rules, evaluated in order
    pub rules: Vec<Rule>,
}

impl Principal {
    /// Principal with directly granted rules and no tenant binding
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            tenant: None,
            rules,
        }
    }

    /// Principal holding no rules; denied everything
    pub fn anonymous() -> Self {
        Self::new("anonymous", Vec::new())
    }

    /// Confine this principal to a tenant
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Principal represented by a stored access token.
    ///
    /// The identity is derived from the token's creator and a short prefix of
    /// its object name; tenant binding comes from the tenant label.
    pub fn from_access_token(token: &AccessToken) -> Self {
        let short: String = token.name_any().chars().take(8).collect();
        Self {
            name: format!("token:{}:{}", token.spec.creator, short),
            tenant: token.labels().get(TENANT_LABEL).cloned(),
            rules: token.spec.rules.iter().map(Rule::from).collect(),
        }
    }
}
