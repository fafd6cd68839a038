//! Error types for the Trellis control plane
//!
//! Errors are structured with fields so callers can tell a rejected request
//! (validation, permission) from a store outcome (not found, conflict) without
//! string matching. Validation-class and permission errors are always raised
//! before any write happens.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Trellis operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error that does not map onto a more specific variant
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Malformed input (bad domain value, identifier mismatch, bad name)
    #[error("validation error for {resource}: {message}")]
    Validation {
        /// Resource the invalid input refers to
        resource: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.domain")
        field: Option<String>,
    },

    /// Lifecycle action not allowed from the current state
    #[error("invalid transition for {resource}: cannot {action} from {from}")]
    InvalidTransition {
        /// Resource being transitioned
        resource: String,
        /// Current state
        from: String,
        /// Requested action (pause, resume, delete)
        action: String,
    },

    /// No rule held by the principal covers the request
    #[error("permission denied: {principal} cannot {verb} {kind}/{name} in namespace {namespace}")]
    PermissionDenied {
        /// Principal identity
        principal: String,
        /// Requested verb
        verb: String,
        /// Requested namespace (or the wildcard scope)
        namespace: String,
        /// Requested kind
        kind: String,
        /// Requested object name
        name: String,
    },

    /// Credentials could not be resolved to a principal
    #[error("unauthenticated: {message}")]
    Unauthenticated {
        /// Why authentication failed
        message: String,
    },

    /// Referenced object is absent
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Object kind
        kind: String,
        /// Object name
        name: String,
    },

    /// Object with the same identity already exists
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// Object kind
        kind: String,
        /// Object name
        name: String,
    },

    /// Optimistic-concurrency failure; the caller should re-read and retry
    #[error("conflict writing {kind} {name}: {message}")]
    Conflict {
        /// Object kind
        kind: String,
        /// Object name
        name: String,
        /// Store-provided detail
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "create_client", "token")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with resource context
    pub fn validation_for(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with resource context and field path
    pub fn validation_for_field(
        resource: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource: resource.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid-transition error
    pub fn invalid_transition(
        resource: impl Into<String>,
        from: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::InvalidTransition {
            resource: resource.into(),
            from: from.into(),
            action: action.into(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: msg.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an already-exists error
    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Map a kube error for a specific object onto the taxonomy.
    ///
    /// 404 becomes `NotFound`; 409 becomes `AlreadyExists` or `Conflict`
    /// depending on the API server's reason.
    pub fn from_kube(source: kube::Error, kind: &str, name: &str) -> Self {
        match &source {
            kube::Error::Api(resp) if resp.code == 404 => Self::not_found(kind, name),
            kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                Self::already_exists(kind, name)
            }
            kube::Error::Api(resp) if resp.code == 409 => {
                Self::conflict(kind, name, resp.message.clone())
            }
            _ => Self::Kube { source },
        }
    }

    /// Rejected before any write: malformed input or disallowed transition
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidTransition { .. })
    }

    /// The operation may succeed if the caller re-reads and retries
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Kube { source } => !matches!(source, kube::Error::Api(resp) if resp.code < 500),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{} happened", reason),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn validation_error_mentions_resource_and_message() {
        let err = Error::validation_for("tenant/acme", "name in path and body mismatch");
        assert!(err.to_string().contains("tenant/acme"));
        assert!(err.to_string().contains("mismatch"));
        assert!(err.is_validation());
    }

    #[test]
    fn invalid_transition_is_validation_class() {
        let err = Error::invalid_transition("tenant/acme", "Deleting", "resume");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "invalid transition for tenant/acme: cannot resume from Deleting"
        );
    }

    #[test]
    fn kube_404_maps_to_not_found() {
        let err = Error::from_kube(api_error(404, "NotFound"), "Tenant", "acme");
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn kube_409_distinguishes_exists_from_conflict() {
        let exists = Error::from_kube(api_error(409, "AlreadyExists"), "Domain", "abc");
        assert!(matches!(exists, Error::AlreadyExists { .. }));

        let conflict = Error::from_kube(api_error(409, "Conflict"), "Tenant", "acme");
        assert!(matches!(conflict, Error::Conflict { .. }));
        assert!(conflict.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = Error::from_kube(api_error(422, "Invalid"), "Tenant", "acme");
        assert!(!err.is_retryable());
        assert!(!Error::validation("bad").is_retryable());
    }
}
