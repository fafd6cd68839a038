//! Tenant manager
//!
//! Tenants are a platform concern: every operation requires `manage` over the
//! whole cluster, so a tenant's own token can never pause, resume or delete
//! the tenant it belongs to. Lifecycle changes are written to the status
//! subresource and then announced to the [`TransitionHook`]; hook failures are
//! logged and do not undo a persisted transition.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use trellis_authz::{AuthorizationEngine, Principal};
use trellis_common::crd::{validate_dns_label, AccessToken, Tenant, TenantPhase, TenantSpec, TenantStatus};
use trellis_common::metrics::record_tenant_transition;
use trellis_common::store::{LabelSelector, ObjectStore};
use trellis_common::{Error, Result, TENANT_LABEL};

use crate::hook::{Transition, TransitionHook};
use crate::lifecycle::{plan_transition, TenantAction};
use crate::token::mint_tenant_token;

/// Tenant as returned to callers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantView {
    /// Tenant name
    pub name: String,
    /// Current phase
    pub phase: TenantPhase,
    /// Tenant spec
    pub spec: TenantSpec,
    /// RFC 3339 creation time, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Plaintext access token; present only in the create response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl From<&Tenant> for TenantView {
    fn from(tenant: &Tenant) -> Self {
        Self {
            name: tenant.name_any(),
            phase: tenant.phase(),
            spec: tenant.spec.clone(),
            created_at: tenant
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|t| t.0.to_rfc3339_opts(SecondsFormat::Secs, true)),
            access_token: None,
        }
    }
}

/// Body of an update request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TenantUpdate {
    /// Must equal the name the update is addressed to
    pub name: String,
    /// Replacement spec
    pub spec: TenantSpec,
}

/// Tenant lifecycle and token issuance over an object store
#[derive(Clone)]
pub struct TenantManager {
    tenants: Arc<dyn ObjectStore<Tenant>>,
    tokens: Arc<dyn ObjectStore<AccessToken>>,
    hook: Arc<dyn TransitionHook>,
    engine: AuthorizationEngine,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn with_phase(mut tenant: Tenant, phase: TenantPhase) -> Tenant {
    tenant.status = Some(TenantStatus {
        phase,
        message: None,
        last_transition_time: Some(now_rfc3339()),
    });
    tenant
}

impl TenantManager {
    /// Create a manager
    pub fn new(
        tenants: Arc<dyn ObjectStore<Tenant>>,
        tokens: Arc<dyn ObjectStore<AccessToken>>,
        hook: Arc<dyn TransitionHook>,
    ) -> Self {
        Self {
            tenants,
            tokens,
            hook,
            engine: AuthorizationEngine::new(),
        }
    }

    /// Create a tenant and mint its access token.
    ///
    /// The returned view is the only place the plaintext token ever appears.
    /// If the token cannot be minted or stored, the tenant is removed again.
    #[instrument(skip(self, principal, spec), fields(principal = %principal.name))]
    pub async fn create(
        &self,
        principal: &Principal,
        name: &str,
        spec: TenantSpec,
    ) -> Result<TenantView> {
        self.authorize(principal)?;
        validate_dns_label(name)
            .map_err(|msg| Error::validation_for_field(format!("tenant/{}", name), "metadata.name", msg))?;

        let desired = with_phase(Tenant::new(name, spec), TenantPhase::Active);
        let created = self.tenants.create(&desired).await?;

        let issued = async {
            // status is ignored on create by the API server
            let mut created = created;
            created.status = desired.status.clone();
            let tenant = self.tenants.update_status(&created).await?;

            // leftovers from an interrupted delete would break the one-token rule
            self.delete_tokens(name).await?;
            let (secret, token) = mint_tenant_token(name, &principal.name)?;
            self.tokens.create(&token).await?;
            Ok::<_, Error>((tenant, secret))
        }
        .await;

        let (tenant, secret) = match issued {
            Ok(issued) => issued,
            Err(e) => {
                warn!(tenant = %name, error = %e, "token issuance failed, removing tenant");
                if let Err(rollback) = self.tenants.delete(None, name).await {
                    warn!(tenant = %name, error = %rollback, "failed to roll back tenant");
                }
                record_tenant_transition("create", "rejected");
                return Err(e);
            }
        };

        record_tenant_transition("create", "changed");
        info!(tenant = %name, "tenant created");
        self.notify(&tenant, Transition::Created).await;

        let mut view = TenantView::from(&tenant);
        view.access_token = Some(secret.into_string());
        Ok(view)
    }

    /// Fetch one tenant
    pub async fn get(&self, principal: &Principal, name: &str) -> Result<TenantView> {
        self.authorize(principal)?;
        let tenant = self.tenants.get(None, name).await?;
        Ok(TenantView::from(&tenant))
    }

    /// All tenants, ordered by name
    pub async fn list(&self, principal: &Principal) -> Result<Vec<TenantView>> {
        self.authorize(principal)?;
        let tenants = self.tenants.list(None, &LabelSelector::new()).await?;
        Ok(tenants.iter().map(TenantView::from).collect())
    }

    /// Replace a tenant's spec.
    ///
    /// `name` is the tenant the request is addressed to; a body naming a
    /// different tenant is rejected before any write. Concurrent writers
    /// surface as [`Error::Conflict`].
    #[instrument(skip(self, principal, update), fields(principal = %principal.name))]
    pub async fn update(
        &self,
        principal: &Principal,
        name: &str,
        update: TenantUpdate,
    ) -> Result<TenantView> {
        self.authorize(principal)?;
        if update.name != name {
            return Err(Error::validation_for_field(
                format!("tenant/{}", name),
                "name",
                format!("body names tenant '{}' but request is for '{}'", update.name, name),
            ));
        }

        let mut tenant = self.tenants.get(None, name).await?;
        if tenant.phase() == TenantPhase::Deleting {
            return Err(Error::invalid_transition(
                format!("tenant/{}", name),
                TenantPhase::Deleting.to_string(),
                "update",
            ));
        }
        tenant.spec = update.spec;
        let updated = self.tenants.update(&tenant).await?;
        Ok(TenantView::from(&updated))
    }

    /// Suspend a tenant; pausing a paused tenant is a no-op
    pub async fn pause(&self, principal: &Principal, name: &str) -> Result<TenantView> {
        self.transition(principal, name, TenantAction::Pause).await
    }

    /// Resume a paused tenant; resuming an active tenant is a no-op
    pub async fn resume(&self, principal: &Principal, name: &str) -> Result<TenantView> {
        self.transition(principal, name, TenantAction::Resume).await
    }

    /// Mark a tenant Deleting, remove its access tokens, then remove it.
    ///
    /// Deleting a tenant already marked Deleting re-runs the cleanup without
    /// another status write or hook call, so an interrupted delete can be
    /// retried to completion.
    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn delete(&self, principal: &Principal, name: &str) -> Result<()> {
        self.authorize(principal)?;
        let tenant = self.tenants.get(None, name).await?;
        if tenant.phase() == TenantPhase::Deleting {
            info!(tenant = %name, "resuming interrupted tenant deletion");
            record_tenant_transition(TenantAction::Delete.as_str(), "resumed");
        } else {
            self.apply(name, tenant, TenantAction::Delete).await?;
        }

        self.delete_tokens(name).await?;
        match self.tenants.delete(None, name).await {
            Ok(()) | Err(Error::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        info!(tenant = %name, "tenant deleted");
        Ok(())
    }

    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    async fn transition(
        &self,
        principal: &Principal,
        name: &str,
        action: TenantAction,
    ) -> Result<TenantView> {
        self.authorize(principal)?;
        let tenant = self.tenants.get(None, name).await?;
        self.apply(name, tenant, action).await
    }

    async fn apply(&self, name: &str, tenant: Tenant, action: TenantAction) -> Result<TenantView> {
        let next = match plan_transition(name, tenant.phase(), action) {
            Ok(next) => next,
            Err(e) => {
                record_tenant_transition(action.as_str(), "rejected");
                return Err(e);
            }
        };
        let Some(next) = next else {
            record_tenant_transition(action.as_str(), "unchanged");
            return Ok(TenantView::from(&tenant));
        };

        let from = tenant.phase();
        let updated = self.tenants.update_status(&with_phase(tenant, next)).await?;
        record_tenant_transition(action.as_str(), "changed");
        info!(tenant = %name, %from, to = %next, "tenant transitioned");

        let transition = match next {
            TenantPhase::Active => Transition::Resumed,
            TenantPhase::Paused => Transition::Paused,
            TenantPhase::Deleting => Transition::Deleting,
        };
        self.notify(&updated, transition).await;

        Ok(TenantView::from(&updated))
    }

    fn authorize(&self, principal: &Principal) -> Result<()> {
        self.engine
            .must_check(principal, &AuthorizationEngine::manage_cluster_request())
    }

    async fn notify(&self, tenant: &Tenant, transition: Transition) {
        if let Err(e) = self.hook.on_transition(tenant, transition).await {
            warn!(tenant = %tenant.name_any(), %transition, error = %e, "transition hook failed");
        }
    }

    async fn delete_tokens(&self, tenant: &str) -> Result<()> {
        let selector = LabelSelector::new().with(TENANT_LABEL, tenant);
        for token in self.tokens.list(None, &selector).await? {
            match self.tokens.delete(None, &token.name_any()).await {
                Ok(()) | Err(Error::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
