//! Rule-based authorization for the Trellis control plane
//!
//! Every control-plane mutation is gated by [`AuthorizationEngine`]. A
//! [`Principal`] holds an ordered list of [`Rule`]s; a request is allowed iff
//! some rule's verb is at or above the requested verb and its namespace, kind
//! and name each equal the request or are `*`.
//!
//! # Request model
//!
//! ```text
//! (manage, *,        tenants, acme)          cluster-scoped tenant
//! (edit,   *,        domains, *)             create any domain
//! (view,   payments, pods,    web-7d9f)      namespaced object
//! ```
//!
//! Principals authenticated from a tenant's access token are additionally
//! bound to that tenant and never match requests targeting another tenant.
//! Namespaced requests learn their owning tenant through a [`TenantResolver`].

#![deny(missing_docs)]

mod engine;
mod principal;
mod request;
mod rule;
mod tenancy;
mod token;

pub use engine::{AuthorizationEngine, DenialReason, KIND_DOMAINS};
pub use principal::Principal;
pub use request::{AccessRequest, Scope};
pub use rule::Rule;
pub use tenancy::{NamespaceTenants, TenantResolver};
pub use token::{access_token_name, AccessTokenSecret, TokenAuthenticator, TokenError};
pub use trellis_common::crd::Verb;
