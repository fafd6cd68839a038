//! In-memory ObjectStore keyed by namespace and name
//!
//! Mirrors the API server's observable contract closely enough for the
//! managers: monotonically increasing resource versions, `AlreadyExists` on
//! duplicate create, and `Conflict` when a write carries a stale version.
//! Used by tests and by embedders that keep tenants outside a cluster.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::{Resource, ResourceExt};

use crate::store::{LabelSelector, ObjectStore};
use crate::{Error, Result};

type Key = (Option<String>, String);

/// Thread-safe in-memory store for one object kind
pub struct MemoryStore<K> {
    objects: DashMap<Key, K>,
    version: AtomicU64,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }
}

impl<K> MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with objects, as if each were created
    pub fn with_objects(objects: impl IntoIterator<Item = K>) -> Self {
        let store = Self::new();
        for object in objects {
            let mut object = object;
            store.stamp(&mut object, true);
            store.objects.insert(key_of(&object), object);
        }
        store
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn stamp(&self, object: &mut K, created: bool) {
        let version = self.next_version();
        let meta = object.meta_mut();
        if created {
            // seeded objects keep their identity
            if meta.uid.is_none() {
                meta.uid = Some(format!("uid-{}", version));
            }
            if meta.creation_timestamp.is_none() {
                meta.creation_timestamp = Some(Time(chrono::Utc::now()));
            }
        }
        meta.resource_version = Some(version);
    }

    fn write(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        match self.objects.entry(key_of(object)) {
            Entry::Vacant(_) => Err(Error::not_found(K::kind(&()), name)),
            Entry::Occupied(mut entry) => {
                let stored = entry.get().meta().resource_version.clone();
                let incoming = object.meta().resource_version.clone();
                if incoming.is_some() && incoming != stored {
                    return Err(Error::conflict(
                        K::kind(&()),
                        name,
                        format!(
                            "resource version {} is stale (current {})",
                            incoming.unwrap_or_default(),
                            stored.unwrap_or_default()
                        ),
                    ));
                }
                let mut updated = object.clone();
                let meta = updated.meta_mut();
                meta.uid = entry.get().meta().uid.clone();
                meta.creation_timestamp = entry.get().meta().creation_timestamp.clone();
                self.stamp(&mut updated, false);
                entry.insert(updated.clone());
                Ok(updated)
            }
        }
    }
}

fn key_of<K: Resource>(object: &K) -> Key {
    (object.meta().namespace.clone(), object.name_any())
}

#[async_trait]
impl<K> ObjectStore<K> for MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    async fn get(&self, namespace: Option<&str>, name: &str) -> Result<K> {
        self.objects
            .get(&(namespace.map(str::to_string), name.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(K::kind(&()), name))
    }

    async fn list(&self, namespace: Option<&str>, selector: &LabelSelector) -> Result<Vec<K>> {
        let mut items: Vec<(Key, K)> = self
            .objects
            .iter()
            .filter(|entry| namespace.is_none() || entry.key().0.as_deref() == namespace)
            .filter(|entry| selector.matches(entry.value().labels()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(items.into_iter().map(|(_, obj)| obj).collect())
    }

    async fn create(&self, object: &K) -> Result<K> {
        let name = object.name_any();
        if name.is_empty() {
            return Err(Error::validation_for(K::kind(&()), "object has no name"));
        }
        match self.objects.entry(key_of(object)) {
            Entry::Occupied(_) => Err(Error::already_exists(K::kind(&()), name)),
            Entry::Vacant(entry) => {
                let mut created = object.clone();
                self.stamp(&mut created, true);
                entry.insert(created.clone());
                Ok(created)
            }
        }
    }

    async fn update(&self, object: &K) -> Result<K> {
        self.write(object)
    }

    async fn update_status(&self, object: &K) -> Result<K> {
        self.write(object)
    }

    async fn delete(&self, namespace: Option<&str>, name: &str) -> Result<()> {
        self.objects
            .remove(&(namespace.map(str::to_string), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(K::kind(&()), name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Tenant, TenantSpec};
    use crate::TENANT_LABEL;

    fn tenant(name: &str) -> Tenant {
        Tenant::new(name, TenantSpec::default())
    }

    #[tokio::test]
    async fn create_assigns_version_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let created = store.create(&tenant("acme")).await.expect("create");
        assert!(created.metadata.resource_version.is_some());
        assert!(created.metadata.uid.is_some());

        let err = store.create(&tenant("acme")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let store = MemoryStore::new();
        let first = store.create(&tenant("acme")).await.expect("create");

        let mut a = first.clone();
        a.spec.plan = Some("gold".to_string());
        store.update(&a).await.expect("first writer wins");

        let mut b = first;
        b.spec.plan = Some("silver".to_string());
        let err = store.update(&b).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        let stored = store.get(None, "acme").await.expect("get");
        assert_eq!(stored.spec.plan.as_deref(), Some("gold"));
    }

    #[tokio::test]
    async fn update_of_missing_object_is_not_found() {
        let store: MemoryStore<Tenant> = MemoryStore::new();
        let err = store.update(&tenant("ghost")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_by_label_and_sorts_by_name() {
        let mut a = tenant("zeta");
        a.labels_mut().insert(TENANT_LABEL.to_string(), "x".to_string());
        let mut b = tenant("alpha");
        b.labels_mut().insert(TENANT_LABEL.to_string(), "x".to_string());
        let c = tenant("other");
        let store = MemoryStore::with_objects([a, b, c]);

        let all = store.list(None, &LabelSelector::new()).await.expect("list");
        assert_eq!(all.len(), 3);

        let selected = store
            .list(None, &LabelSelector::new().with(TENANT_LABEL, "x"))
            .await
            .expect("list");
        let names: Vec<String> = selected.iter().map(|t| t.name_any()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn delete_removes_and_reports_missing() {
        let store = MemoryStore::with_objects([tenant("acme")]);
        store.delete(None, "acme").await.expect("delete");
        assert!(store.is_empty());
        let err = store.delete(None, "acme").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
