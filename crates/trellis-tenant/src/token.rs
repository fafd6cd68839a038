//! Tenant access-token minting

use chrono::{SecondsFormat, Utc};
use kube::ResourceExt;

use trellis_authz::{AccessTokenSecret, Rule};
use trellis_common::crd::{AccessToken, AccessTokenRule, AccessTokenSpec};
use trellis_common::{Result, TENANT_LABEL};

/// Mint the full-privilege token for a tenant.
///
/// Returns the plaintext secret and the object to store. The object carries
/// only the secret's digest (as its name), the view/edit/manage rules over
/// everything, the creator and the tenant label.
pub fn mint_tenant_token(tenant: &str, creator: &str) -> Result<(AccessTokenSecret, AccessToken)> {
    let secret = AccessTokenSecret::generate()?;
    let rules: Vec<AccessTokenRule> = Rule::full_privilege().iter().map(Into::into).collect();

    let mut token = AccessToken::new(
        &secret.object_name(),
        AccessTokenSpec {
            rules,
            creator: creator.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            expired_at: None,
        },
    );
    token
        .labels_mut()
        .insert(TENANT_LABEL.to_string(), tenant.to_string());

    Ok((secret, token))
}
