//! Custom Resource Definitions for Trellis
//!
//! All Trellis resources are cluster-scoped: tenants own namespaces, so the
//! objects describing them cannot live inside one.

mod access_token;
mod domain;
mod tenant;

pub use access_token::{AccessToken, AccessTokenRule, AccessTokenSpec, Verb};
pub use domain::{Domain, DomainSpec, DomainStatus};
pub use tenant::{Tenant, TenantPhase, TenantSpec, TenantStatus};

/// Validate a DNS-1123 label (lowercase alphanumeric with hyphens, max 63).
///
/// Used for tenant names and for each label of a domain value.
pub fn validate_dns_label(s: &str) -> Result<(), String> {
    if s.is_empty() {
        return Err("label cannot be empty".to_string());
    }
    if s.len() > 63 {
        return Err(format!("label exceeds 63 characters: {}", s));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "label must be lowercase alphanumeric with hyphens: {}",
            s
        ));
    }
    if s.starts_with('-') || s.ends_with('-') {
        return Err(format!("label cannot start or end with hyphen: {}", s));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_labels() {
        assert!(validate_dns_label("acme").is_ok());
        assert!(validate_dns_label("team-42").is_ok());
        assert!(validate_dns_label("0day").is_ok());
    }

    #[test]
    fn rejects_malformed_labels() {
        assert!(validate_dns_label("").is_err());
        assert!(validate_dns_label("-edge").is_err());
        assert!(validate_dns_label("edge-").is_err());
        assert!(validate_dns_label("Upper").is_err());
        assert!(validate_dns_label("dot.ted").is_err());
        assert!(validate_dns_label(&"a".repeat(64)).is_err());
    }
}
