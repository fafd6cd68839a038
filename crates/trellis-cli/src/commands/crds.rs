//! `trellis crds` - print CRD manifests for installation

use kube::CustomResourceExt;

use trellis_common::crd::{AccessToken, Domain, Tenant};

use crate::Result;

/// All CRD manifests as one multi-document YAML stream
pub fn render() -> Result<String> {
    let docs = [
        serde_yaml::to_string(&Tenant::crd())?,
        serde_yaml::to_string(&Domain::crd())?,
        serde_yaml::to_string(&AccessToken::crd())?,
    ];
    Ok(docs.join("---\n"))
}

pub fn run() -> Result<()> {
    print!("{}", render()?);
    Ok(())
}
