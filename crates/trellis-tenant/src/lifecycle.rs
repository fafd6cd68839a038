//! Tenant lifecycle state machine
//!
//! ```text
//!            pause                 delete
//!   Active ─────────▶ Paused ─────────────▶ Deleting ──▶ (removed)
//!      ▲   ◀───────── │                        ▲
//!      │    resume                             │
//!      └───────────────────────────────────────┘
//!                        delete
//! ```
//!
//! Pause on Paused and Resume on Active succeed without a write. Every action
//! on Deleting is rejected.

use std::fmt;

use trellis_common::crd::TenantPhase;
use trellis_common::{Error, Result};

/// Lifecycle action requested on a tenant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TenantAction {
    /// Suspend the tenant's compute
    Pause,
    /// Undo a pause
    Resume,
    /// Begin teardown
    Delete,
}

impl TenantAction {
    /// Lowercase name used in errors and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantAction::Pause => "pause",
            TenantAction::Resume => "resume",
            TenantAction::Delete => "delete",
        }
    }
}

impl fmt::Display for TenantAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase a tenant moves to under `action`.
///
/// `Ok(None)` means the tenant is already where the action would put it.
pub fn plan_transition(
    name: &str,
    from: TenantPhase,
    action: TenantAction,
) -> Result<Option<TenantPhase>> {
    use TenantAction::*;
    use TenantPhase::*;

    match (from, action) {
        (Active, Pause) => Ok(Some(Paused)),
        (Paused, Pause) => Ok(None),
        (Paused, Resume) => Ok(Some(Active)),
        (Active, Resume) => Ok(None),
        (Active | Paused, Delete) => Ok(Some(Deleting)),
        (Deleting, _) => Err(Error::invalid_transition(
            format!("tenant/{}", name),
            from.to_string(),
            action.as_str(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TenantAction::*;
    use TenantPhase::*;

    #[test]
    fn pause_and_resume_flip_state() {
        assert_eq!(plan_transition("t", Active, Pause).unwrap(), Some(Paused));
        assert_eq!(plan_transition("t", Paused, Resume).unwrap(), Some(Active));
    }

    #[test]
    fn repeated_actions_are_noops() {
        assert_eq!(plan_transition("t", Paused, Pause).unwrap(), None);
        assert_eq!(plan_transition("t", Active, Resume).unwrap(), None);
    }

    #[test]
    fn delete_from_live_phases() {
        assert_eq!(plan_transition("t", Active, Delete).unwrap(), Some(Deleting));
        assert_eq!(plan_transition("t", Paused, Delete).unwrap(), Some(Deleting));
    }

    #[test]
    fn deleting_is_terminal() {
        for action in [Pause, Resume, Delete] {
            let err = plan_transition("acme", Deleting, action).unwrap_err();
            assert!(err.is_validation());
            assert!(matches!(
                err,
                Error::InvalidTransition { ref from, .. } if from == "Deleting"
            ));
        }
    }
}
