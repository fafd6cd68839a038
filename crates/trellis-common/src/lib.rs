//! Common types for Trellis: CRDs, errors, the object store seam, and telemetry
//!
//! Every other Trellis crate builds on this one. It owns:
//! - [`crd`] - Tenant, Domain and AccessToken custom resources
//! - [`store`] - the `ObjectStore` trait and its kube-backed implementation
//! - [`memory`] - an in-memory `ObjectStore` keyed by namespace/name
//! - [`error`] - the control-plane error taxonomy
//! - [`telemetry`] / [`metrics`] - logging and metrics setup

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod hashing;
pub mod kube_utils;
pub mod memory;
pub mod metrics;
pub mod store;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group for all Trellis custom resources
pub const API_GROUP: &str = "trellis.dev";

/// Label carrying the owning tenant of an object
pub const TENANT_LABEL: &str = "trellis.dev/tenant";

/// Label carrying the component a pod or job belongs to
pub const COMPONENT_LABEL: &str = "trellis.dev/component";

/// Wildcard value for rule fields and cluster-scoped namespaces
pub const WILDCARD: &str = "*";

/// Field manager name used for writes
pub const FIELD_MANAGER: &str = "trellis-controller";
