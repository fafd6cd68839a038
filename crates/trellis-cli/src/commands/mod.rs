//! CLI commands

use std::sync::Arc;

use clap::ValueEnum;
use kube::Client;
use serde::Serialize;
use tracing::debug;

use trellis_authz::{Principal, Rule, TokenAuthenticator};
use trellis_common::crd::AccessToken;
use trellis_common::kube_utils::create_client_with_timeout;
use trellis_common::store::KubeStore;

use crate::config::GlobalArgs;
use crate::Result;

pub mod crds;
pub mod domain;
pub mod format;
pub mod status;
pub mod tenant;

/// Identity used when no access token is supplied
pub const OPERATOR_PRINCIPAL: &str = "kubeconfig-operator";

/// Output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Columnar table (default)
    #[default]
    Table,
    /// JSON
    Json,
}

/// A connected client and the principal acting through it
pub struct Session {
    pub client: Client,
    pub principal: Principal,
}

impl Session {
    /// Connect to the cluster and resolve the acting principal.
    ///
    /// With `--token` the principal is whatever the stored AccessToken grants;
    /// without one, the kubeconfig holder already has cluster-admin rights and
    /// acts with full privilege.
    pub async fn connect(global: &GlobalArgs) -> Result<Self> {
        let client = create_client_with_timeout(
            global.kubeconfig.as_deref(),
            global.connect_timeout(),
            global.read_timeout(),
        )
        .await?;

        let principal = match global.token.as_deref() {
            Some(token) => {
                let tokens = Arc::new(KubeStore::<AccessToken>::cluster(client.clone()));
                TokenAuthenticator::new(tokens).authenticate(token).await?
            }
            None => Principal::new(OPERATOR_PRINCIPAL, Rule::full_privilege()),
        };
        debug!(principal = %principal.name, "session established");

        Ok(Self { client, principal })
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
