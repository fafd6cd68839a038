//! Capability rules

use serde::{Deserialize, Serialize};

use trellis_common::crd::{AccessTokenRule, Verb};
use trellis_common::WILDCARD;

use crate::request::AccessRequest;

/// A `(verb, namespace, kind, name)` grant; any field except the verb may be `*`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Highest verb granted; implies every lower verb
    pub verb: Verb,
    /// Namespace or `*`
    pub namespace: String,
    /// Kind or `*`
    pub kind: String,
    /// Name or `*`
    pub name: String,
}

impl Rule {
    /// Build a rule from its four fields
    pub fn new(
        verb: Verb,
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            verb,
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// `verb` over everything
    pub fn everything(verb: Verb) -> Self {
        Self::new(verb, WILDCARD, WILDCARD, WILDCARD)
    }

    /// The view/edit/manage triple over everything
    pub fn full_privilege() -> Vec<Rule> {
        Verb::ALL.into_iter().map(Self::everything).collect()
    }

    /// Whether this rule covers the request
    pub fn permits(&self, request: &AccessRequest) -> bool {
        self.verb.implies(request.verb)
            && field_matches(&self.namespace, request.scope.as_str())
            && field_matches(&self.kind, &request.kind)
            && field_matches(&self.name, &request.name)
    }
}

fn field_matches(granted: &str, requested: &str) -> bool {
    granted == WILDCARD || granted == requested
}

impl From<&AccessTokenRule> for Rule {
    fn from(rule: &AccessTokenRule) -> Self {
        Self::new(rule.verb, &rule.namespace, &rule.kind, &rule.name)
    }
}

impl From<&Rule> for AccessTokenRule {
    fn from(rule: &Rule) -> Self {
        AccessTokenRule {
            verb: rule.verb,
            namespace: rule.namespace.clone(),
            kind: rule.kind.clone(),
            name: rule.name.clone(),
        }
    }
}
