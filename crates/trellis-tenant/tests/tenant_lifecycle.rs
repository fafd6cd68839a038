//! Tenant lifecycle against the in-memory store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kube::ResourceExt;

use trellis_authz::{AuthorizationEngine, NamespaceTenants, Principal, Rule, TokenAuthenticator, Verb};
use trellis_common::crd::{AccessToken, Tenant, TenantPhase, TenantSpec};
use trellis_common::memory::MemoryStore;
use trellis_common::store::{LabelSelector, ObjectStore};
use trellis_common::{Error, Result, TENANT_LABEL};
use trellis_tenant::{TenantManager, TenantUpdate, Transition, TransitionHook};

#[derive(Default)]
struct RecordingHook {
    seen: Mutex<Vec<(String, Transition)>>,
}

impl RecordingHook {
    fn seen(&self) -> Vec<(String, Transition)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransitionHook for RecordingHook {
    async fn on_transition(&self, tenant: &Tenant, transition: Transition) -> Result<()> {
        self.seen.lock().unwrap().push((tenant.name_any(), transition));
        Ok(())
    }
}

struct Fixture {
    manager: TenantManager,
    tenants: Arc<MemoryStore<Tenant>>,
    tokens: Arc<MemoryStore<AccessToken>>,
    hook: Arc<RecordingHook>,
}

fn fixture() -> Fixture {
    let tenants = Arc::new(MemoryStore::<Tenant>::new());
    let tokens = Arc::new(MemoryStore::<AccessToken>::new());
    let hook = Arc::new(RecordingHook::default());
    let manager = TenantManager::new(tenants.clone(), tokens.clone(), hook.clone());
    Fixture {
        manager,
        tenants,
        tokens,
        hook,
    }
}

fn admin() -> Principal {
    Principal::new("admin", Rule::full_privilege())
}

fn spec(plan: &str) -> TenantSpec {
    TenantSpec {
        display_name: Some("ACME Corp".to_string()),
        plan: Some(plan.to_string()),
        owners: vec!["ops@acme.example".to_string()],
    }
}

async fn tokens_for(f: &Fixture, tenant: &str) -> Vec<AccessToken> {
    f.tokens
        .list(None, &LabelSelector::new().with(TENANT_LABEL, tenant))
        .await
        .unwrap()
}

// =============================================================================
// Create and token issuance
// =============================================================================

#[tokio::test]
async fn create_mints_exactly_one_full_privilege_token() {
    let f = fixture();
    let view = f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    assert_eq!(view.name, "acme");
    assert_eq!(view.phase, TenantPhase::Active);
    let secret = view.access_token.expect("plaintext token in create response");

    let tokens = tokens_for(&f, "acme").await;
    assert_eq!(tokens.len(), 1);
    let token = &tokens[0];
    assert_eq!(token.spec.creator, "admin");
    assert_eq!(token.spec.rules.len(), 3);

    // stored object does not contain the plaintext
    let stored = serde_json::to_string(token).unwrap();
    assert!(!stored.contains(&secret));

    assert_eq!(f.hook.seen(), vec![("acme".to_string(), Transition::Created)]);
}

#[tokio::test]
async fn plaintext_token_is_returned_only_once() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    assert!(f.manager.get(&admin(), "acme").await.unwrap().access_token.is_none());
    assert!(f
        .manager
        .list(&admin())
        .await
        .unwrap()
        .iter()
        .all(|t| t.access_token.is_none()));
    assert!(f.manager.pause(&admin(), "acme").await.unwrap().access_token.is_none());
}

#[tokio::test]
async fn minted_token_authenticates_as_tenant_bound_principal() {
    let f = fixture();
    let view = f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();
    f.manager.create(&admin(), "globex", spec("standard")).await.unwrap();
    let secret = view.access_token.unwrap();

    let auth = TokenAuthenticator::new(f.tokens.clone());
    let principal = auth.authenticate(&secret).await.unwrap();
    assert_eq!(principal.tenant.as_deref(), Some("acme"));

    let engine = AuthorizationEngine::with_tenants(Arc::new(
        NamespaceTenants::new()
            .with("acme-web", "acme")
            .with("globex-web", "globex"),
    ));
    assert!(engine.can_manage(&principal, "acme-web", "pods", "*"));
    assert!(!engine.can_manage(&principal, "globex-web", "pods", "*"));
}

#[tokio::test]
async fn tenant_token_cannot_manage_tenants() {
    let f = fixture();
    let view = f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();
    let auth = TokenAuthenticator::new(f.tokens.clone());
    let principal = auth.authenticate(&view.access_token.unwrap()).await.unwrap();

    let denied = |result: Result<()>| matches!(result, Err(Error::PermissionDenied { .. }));
    assert!(denied(f.manager.get(&principal, "acme").await.map(|_| ())));
    assert!(denied(f.manager.list(&principal).await.map(|_| ())));
    assert!(denied(f.manager.pause(&principal, "acme").await.map(|_| ())));
    assert!(denied(f.manager.resume(&principal, "acme").await.map(|_| ())));
    assert!(denied(f.manager.delete(&principal, "acme").await));
    assert!(denied(
        f.manager
            .create(&principal, "acme-two", spec("standard"))
            .await
            .map(|_| ())
    ));

    let stored = f.tenants.get(None, "acme").await.unwrap();
    assert_eq!(stored.phase(), TenantPhase::Active);
    assert_eq!(tokens_for(&f, "acme").await.len(), 1);
}

#[tokio::test]
async fn duplicate_create_keeps_single_token() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    let err = f
        .manager
        .create(&admin(), "acme", spec("standard"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));
    assert_eq!(tokens_for(&f, "acme").await.len(), 1);
}

#[tokio::test]
async fn unprivileged_principal_cannot_create() {
    let f = fixture();
    let viewer = Principal::new("viewer", vec![Rule::everything(Verb::View)]);

    let err = f
        .manager
        .create(&viewer, "acme", spec("standard"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied { .. }));
    assert!(f.tenants.is_empty());
    assert!(f.tokens.is_empty());
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn update_rejects_name_mismatch_before_write() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();
    let before = f.tenants.get(None, "acme").await.unwrap();

    let err = f
        .manager
        .update(
            &admin(),
            "acme",
            TenantUpdate {
                name: "globex".to_string(),
                spec: spec("enterprise"),
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let after = f.tenants.get(None, "acme").await.unwrap();
    assert_eq!(before.resource_version(), after.resource_version());
    assert_eq!(after.spec.plan.as_deref(), Some("standard"));
}

#[tokio::test]
async fn update_replaces_spec() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    let view = f
        .manager
        .update(
            &admin(),
            "acme",
            TenantUpdate {
                name: "acme".to_string(),
                spec: spec("enterprise"),
            },
        )
        .await
        .unwrap();
    assert_eq!(view.spec.plan.as_deref(), Some("enterprise"));
    assert_eq!(view.phase, TenantPhase::Active);
}

#[tokio::test]
async fn stale_write_surfaces_conflict() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    let stale = f.tenants.get(None, "acme").await.unwrap();
    f.manager.pause(&admin(), "acme").await.unwrap();

    let err = f.tenants.update(&stale).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
    assert!(err.is_retryable());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn pause_resume_round_trip() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    assert_eq!(
        f.manager.pause(&admin(), "acme").await.unwrap().phase,
        TenantPhase::Paused
    );
    // pausing again succeeds without another transition
    assert_eq!(
        f.manager.pause(&admin(), "acme").await.unwrap().phase,
        TenantPhase::Paused
    );
    assert_eq!(
        f.manager.resume(&admin(), "acme").await.unwrap().phase,
        TenantPhase::Active
    );

    let transitions: Vec<Transition> = f.hook.seen().into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        transitions,
        vec![Transition::Created, Transition::Paused, Transition::Resumed]
    );
}

#[tokio::test]
async fn deleting_tenant_rejects_resume_but_delete_completes() {
    let f = fixture();
    f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    // a delete interrupted after marking Deleting
    let mut deleting = f.tenants.get(None, "acme").await.unwrap();
    if let Some(status) = deleting.status.as_mut() {
        status.phase = TenantPhase::Deleting;
    }
    f.tenants.update_status(&deleting).await.unwrap();

    for result in [
        f.manager.resume(&admin(), "acme").await,
        f.manager.pause(&admin(), "acme").await,
    ] {
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
    }

    f.manager.delete(&admin(), "acme").await.unwrap();
    assert!(f.tenants.is_empty());
    assert!(tokens_for(&f, "acme").await.is_empty());
    assert_eq!(f.hook.seen(), vec![("acme".to_string(), Transition::Created)]);
}

/// Token store whose first delete fails
struct FlakyTokens {
    inner: MemoryStore<AccessToken>,
    failed: AtomicBool,
}

#[async_trait]
impl ObjectStore<AccessToken> for FlakyTokens {
    async fn get(&self, namespace: Option<&str>, name: &str) -> Result<AccessToken> {
        self.inner.get(namespace, name).await
    }

    async fn list(
        &self,
        namespace: Option<&str>,
        selector: &LabelSelector,
    ) -> Result<Vec<AccessToken>> {
        self.inner.list(namespace, selector).await
    }

    async fn create(&self, object: &AccessToken) -> Result<AccessToken> {
        self.inner.create(object).await
    }

    async fn update(&self, object: &AccessToken) -> Result<AccessToken> {
        self.inner.update(object).await
    }

    async fn update_status(&self, object: &AccessToken) -> Result<AccessToken> {
        self.inner.update_status(object).await
    }

    async fn delete(&self, namespace: Option<&str>, name: &str) -> Result<()> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(Error::internal("api server unavailable"));
        }
        self.inner.delete(namespace, name).await
    }
}

#[tokio::test]
async fn interrupted_delete_can_be_retried() {
    let tenants = Arc::new(MemoryStore::<Tenant>::new());
    let tokens = Arc::new(FlakyTokens {
        inner: MemoryStore::new(),
        failed: AtomicBool::new(false),
    });
    let hook = Arc::new(RecordingHook::default());
    let manager = TenantManager::new(tenants.clone(), tokens.clone(), hook.clone());
    manager.create(&admin(), "acme", spec("standard")).await.unwrap();

    assert!(manager.delete(&admin(), "acme").await.is_err());
    let stuck = tenants.get(None, "acme").await.unwrap();
    assert_eq!(stuck.phase(), TenantPhase::Deleting);

    manager.delete(&admin(), "acme").await.unwrap();
    assert!(matches!(
        tenants.get(None, "acme").await,
        Err(Error::NotFound { .. })
    ));
    assert!(tokens.inner.is_empty());

    let deleting = hook
        .seen()
        .into_iter()
        .filter(|(_, t)| *t == Transition::Deleting)
        .count();
    assert_eq!(deleting, 1);
}

#[tokio::test]
async fn delete_removes_tenant_and_its_tokens() {
    let f = fixture();
    let acme = f.manager.create(&admin(), "acme", spec("standard")).await.unwrap();
    f.manager.create(&admin(), "globex", spec("standard")).await.unwrap();
    f.manager.pause(&admin(), "acme").await.unwrap();

    f.manager.delete(&admin(), "acme").await.unwrap();

    assert!(matches!(
        f.manager.get(&admin(), "acme").await,
        Err(Error::NotFound { .. })
    ));
    assert!(tokens_for(&f, "acme").await.is_empty());
    assert_eq!(tokens_for(&f, "globex").await.len(), 1);

    let auth = TokenAuthenticator::new(f.tokens.clone());
    assert!(matches!(
        auth.authenticate(&acme.access_token.unwrap()).await,
        Err(Error::Unauthenticated { .. })
    ));

    let last = f.hook.seen().pop().unwrap();
    assert_eq!(last, ("acme".to_string(), Transition::Deleting));
}

#[tokio::test]
async fn operations_on_missing_tenant_are_not_found() {
    let f = fixture();
    assert!(matches!(
        f.manager.pause(&admin(), "ghost").await,
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        f.manager.delete(&admin(), "ghost").await,
        Err(Error::NotFound { .. })
    ));
}
