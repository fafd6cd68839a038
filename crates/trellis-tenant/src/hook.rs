//! Side effects triggered by tenant transitions
//!
//! Suspending compute on pause, restoring it on resume and tearing down
//! tenant workloads on delete happen outside this crate. The manager calls a
//! [`TransitionHook`] after each persisted transition.

use std::fmt;

use async_trait::async_trait;
use kube::ResourceExt;
#[cfg(test)]
use mockall::automock;
use tracing::info;

use trellis_common::crd::Tenant;
use trellis_common::Result;

/// A persisted tenant lifecycle change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Tenant was created Active
    Created,
    /// Active to Paused
    Paused,
    /// Paused to Active
    Resumed,
    /// Marked for deletion
    Deleting,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Transition::Created => "created",
            Transition::Paused => "paused",
            Transition::Resumed => "resumed",
            Transition::Deleting => "deleting",
        };
        f.write_str(s)
    }
}

/// Receiver of tenant transitions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransitionHook: Send + Sync {
    /// Called once the transition is persisted
    async fn on_transition(&self, tenant: &Tenant, transition: Transition) -> Result<()>;
}

/// Hook that only logs
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHook;

#[async_trait]
impl TransitionHook for LoggingHook {
    async fn on_transition(&self, tenant: &Tenant, transition: Transition) -> Result<()> {
        info!(tenant = %tenant.name_any(), %transition, "tenant transition");
        Ok(())
    }
}
