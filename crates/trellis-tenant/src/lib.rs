//! Tenant lifecycle and domain management for the Trellis control plane
//!
//! - [`TenantManager`] - create/get/list/update/pause/resume/delete tenants,
//!   minting one full-privilege access token per tenant at creation
//! - [`DomainManager`] - create/get/list/delete content-addressed domains
//!
//! Every operation takes the acting [`Principal`](trellis_authz::Principal)
//! and is authorized before any write.

#![deny(missing_docs)]

mod domain;
mod hook;
mod lifecycle;
mod manager;
mod token;

pub use domain::{validate_domain, DomainManager};
pub use hook::{LoggingHook, Transition, TransitionHook};
pub use lifecycle::{plan_transition, TenantAction};
pub use manager::{TenantManager, TenantUpdate, TenantView};
pub use token::mint_tenant_token;
