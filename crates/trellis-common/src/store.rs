//! ObjectStore - the seam between the control-plane core and cluster storage
//!
//! Managers never talk to `kube::Api` directly. They hold an `ObjectStore<K>`
//! per kind, which lets tests swap in [`crate::memory::MemoryStore`] and keeps
//! optimistic concurrency (resource versions) a store concern.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{Error, Result, FIELD_MANAGER};

/// Equality-based label selector (`key=value,key2=value2`)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector {
    labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Empty selector matching every object
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required `key=value` pair
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Whether the selector has no requirements
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether a label map satisfies every requirement
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.labels
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        f.write_str(&pairs.join(","))
    }
}

/// Generic versioned object storage.
///
/// `namespace = None` addresses cluster-scoped objects, or all namespaces when
/// listing a namespaced kind. Writes honour the object's `resourceVersion`:
/// a stale version yields [`Error::Conflict`] which callers surface unchanged.
#[async_trait]
pub trait ObjectStore<K>: Send + Sync
where
    K: Clone + Send + Sync + 'static,
{
    /// Fetch one object; absent objects are [`Error::NotFound`]
    async fn get(&self, namespace: Option<&str>, name: &str) -> Result<K>;

    /// List objects matching the selector, ordered by namespace then name
    async fn list(&self, namespace: Option<&str>, selector: &LabelSelector) -> Result<Vec<K>>;

    /// Create a new object; duplicates are [`Error::AlreadyExists`]
    async fn create(&self, object: &K) -> Result<K>;

    /// Replace an object's spec and metadata
    async fn update(&self, object: &K) -> Result<K>;

    /// Replace an object's status
    async fn update_status(&self, object: &K) -> Result<K>;

    /// Delete an object
    async fn delete(&self, namespace: Option<&str>, name: &str) -> Result<()>;
}

/// Fetch an object, mapping [`Error::NotFound`] to `None`
pub async fn get_optional<K, S>(store: &S, namespace: Option<&str>, name: &str) -> Result<Option<K>>
where
    K: Clone + Send + Sync + 'static,
    S: ObjectStore<K> + ?Sized,
{
    match store.get(namespace, name).await {
        Ok(obj) => Ok(Some(obj)),
        Err(Error::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

type ApiFactory<K> = fn(Client, Option<&str>) -> Api<K>;

/// [`ObjectStore`] backed by the Kubernetes API server
pub struct KubeStore<K> {
    client: Client,
    api_for: ApiFactory<K>,
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    /// Store for a namespaced kind (pods, events, jobs)
    pub fn namespaced(client: Client) -> Self {
        Self {
            client,
            api_for: |client, namespace| match namespace {
                Some(ns) => Api::namespaced(client, ns),
                None => Api::all(client),
            },
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<Scope = ClusterResourceScope, DynamicType = ()>,
{
    /// Store for a cluster-scoped kind (tenants, domains, access tokens)
    pub fn cluster(client: Client) -> Self {
        Self {
            client,
            api_for: |client, _| Api::all(client),
        }
    }
}

impl<K> KubeStore<K> {
    fn api(&self, namespace: Option<&str>) -> Api<K> {
        (self.api_for)(self.client.clone(), namespace)
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeStore<K>
where
    K: Resource<DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    #[instrument(skip(self), fields(kind = %K::kind(&())))]
    async fn get(&self, namespace: Option<&str>, name: &str) -> Result<K> {
        self.api(namespace)
            .get(name)
            .await
            .map_err(|e| Error::from_kube(e, &K::kind(&()), name))
    }

    #[instrument(skip(self), fields(kind = %K::kind(&())))]
    async fn list(&self, namespace: Option<&str>, selector: &LabelSelector) -> Result<Vec<K>> {
        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(&selector.to_string());
        }
        let list = self.api(namespace).list(&params).await?;
        let mut items = list.items;
        items.sort_by(|a, b| (a.namespace(), a.name_any()).cmp(&(b.namespace(), b.name_any())));
        debug!(count = items.len(), "listed objects");
        Ok(items)
    }

    async fn create(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        self.api(object.meta().namespace.as_deref())
            .create(&PostParams::default(), object)
            .await
            .map_err(|e| Error::from_kube(e, &K::kind(&()), &name))
    }

    async fn update(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        self.api(object.meta().namespace.as_deref())
            .replace(&name, &PostParams::default(), object)
            .await
            .map_err(|e| Error::from_kube(e, &K::kind(&()), &name))
    }

    async fn update_status(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        let value = serde_json::to_value(object)?;
        // resourceVersion in the patch keeps the write optimistic
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": object.meta().resource_version },
            "status": value.get("status").cloned().unwrap_or(serde_json::Value::Null),
        });
        self.api(object.meta().namespace.as_deref())
            .patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
            .map_err(|e| Error::from_kube(e, &K::kind(&()), &name))
    }

    async fn delete(&self, namespace: Option<&str>, name: &str) -> Result<()> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| Error::from_kube(e, &K::kind(&()), name))?;
        Ok(())
    }
}
