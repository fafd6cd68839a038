//! Metrics registry for Trellis observability
//!
//! Provides OpenTelemetry metrics for:
//! - Authorization decisions
//! - Tenant lifecycle transitions
//! - Status derivation outcomes
//! - Degraded auxiliary fetches
//!
//! Instruments record through the global meter; they are no-ops until the
//! embedding process installs a meter provider.

use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;

/// Global meter for Trellis metrics
static METER: Lazy<Meter> = Lazy::new(|| global::meter("trellis"));

/// Counter of authorization decisions
///
/// Labels:
/// - `decision`: allow, deny
/// - `verb`: view, edit, manage
pub static AUTHZ_DECISIONS: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("trellis_authz_decisions_total")
        .with_description("Total number of authorization decisions")
        .with_unit("{decisions}")
        .build()
});

/// Counter of tenant lifecycle transitions
///
/// Labels:
/// - `action`: create, pause, resume, delete
/// - `result`: changed, unchanged, rejected, resumed
pub static TENANT_TRANSITIONS: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("trellis_tenant_transitions_total")
        .with_description("Total number of tenant lifecycle transitions")
        .with_unit("{transitions}")
        .build()
});

/// Counter of derived pod statuses
///
/// Labels:
/// - `status`: Pending, Running, Succeeded, Failed
pub static POD_STATUS_DERIVATIONS: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("trellis_pod_status_derivations_total")
        .with_description("Total number of derived pod statuses by result")
        .with_unit("{pods}")
        .build()
});

/// Counter of auxiliary fetches that failed and were degraded to empty
///
/// Labels:
/// - `source`: events, metrics
pub static DEGRADED_FETCHES: Lazy<Counter<u64>> = Lazy::new(|| {
    METER
        .u64_counter("trellis_degraded_fetches_total")
        .with_description("Auxiliary fetches that failed and were served empty")
        .with_unit("{fetches}")
        .build()
});

/// Authorization decision outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthDecision {
    /// Request allowed
    Allow,
    /// Request denied
    Deny,
}

impl AuthDecision {
    fn as_str(&self) -> &'static str {
        match self {
            AuthDecision::Allow => "allow",
            AuthDecision::Deny => "deny",
        }
    }
}

/// Record an authorization decision
pub fn record_authz_decision(decision: AuthDecision, verb: &str) {
    AUTHZ_DECISIONS.add(
        1,
        &[
            KeyValue::new("decision", decision.as_str()),
            KeyValue::new("verb", verb.to_string()),
        ],
    );
}

/// Record a tenant lifecycle transition attempt
pub fn record_tenant_transition(action: &str, result: &str) {
    TENANT_TRANSITIONS.add(
        1,
        &[
            KeyValue::new("action", action.to_string()),
            KeyValue::new("result", result.to_string()),
        ],
    );
}

/// Record a derived pod status
pub fn record_pod_status(status: &str) {
    POD_STATUS_DERIVATIONS.add(1, &[KeyValue::new("status", status.to_string())]);
}

/// Record an auxiliary fetch served empty after failure
pub fn record_degraded_fetch(source: &str) {
    DEGRADED_FETCHES.add(1, &[KeyValue::new("source", source.to_string())]);
}
