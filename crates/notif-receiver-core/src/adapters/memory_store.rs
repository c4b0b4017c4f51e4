//! In-memory [`ObjectStore`] used by unit and end-to-end tests.

use crate::receiver::{Receiver, Secret};
use crate::store::{labels_match, ObjectRef, ObjectStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Clone, Eq, PartialEq, Hash)]
struct ObjectKey {
    api_version: String,
    kind: String,
    namespace: String,
    name: String,
}

/// A fixed-snapshot object graph kept entirely in memory.
///
/// Receivers are indexed by `webhook_path` on insert; objects and secrets are
/// keyed by `(apiVersion, kind, namespace, name)`. Intended for tests, not
/// for production use — there is no persistence and no watch/reconcile loop.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectKey, ObjectRef>>,
    receivers: RwLock<Vec<Receiver>>,
    secrets: RwLock<HashMap<(String, String), Secret>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_object(&self, object: ObjectRef) {
        let key = ObjectKey {
            api_version: object.api_version.clone(),
            kind: object.kind.clone(),
            namespace: object.namespace.clone(),
            name: object.name.clone(),
        };
        self.objects.write().await.insert(key, object);
    }

    pub async fn put_receiver(&self, receiver: Receiver) {
        self.receivers.write().await.push(receiver);
    }

    pub async fn put_secret(&self, namespace: &str, name: &str, secret: Secret) {
        self.secrets
            .write()
            .await
            .insert((namespace.to_string(), name.to_string()), secret);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectRef, StoreError> {
        let key = ObjectKey {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        };
        self.objects
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        selector: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ObjectRef>, StoreError> {
        let empty = HashMap::new();
        let selector = selector.unwrap_or(&empty);
        let matches = self
            .objects
            .read()
            .await
            .values()
            .filter(|o| {
                o.api_version == api_version
                    && o.kind == kind
                    && o.namespace == namespace
                    && labels_match(selector, &o.labels())
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn annotate(&self, object: &ObjectRef, key: &str, value: &str) -> Result<(), StoreError> {
        let object_key = ObjectKey {
            api_version: object.api_version.clone(),
            kind: object.kind.clone(),
            namespace: object.namespace.clone(),
            name: object.name.clone(),
        };
        let mut objects = self.objects.write().await;
        let stored = objects
            .get_mut(&object_key)
            .ok_or_else(|| StoreError::NotFound {
                api_version: object.api_version.clone(),
                kind: object.kind.clone(),
                namespace: object.namespace.clone(),
                name: object.name.clone(),
            })?;
        stored
            .body
            .pointer_mut("/metadata")
            .and_then(|m| m.as_object_mut())
            .map(|m| {
                m.entry("annotations")
                    .or_insert_with(|| serde_json::json!({}))
                    .as_object_mut()
                    .map(|a| a.insert(key.to_string(), serde_json::Value::String(value.to_string())))
            });
        Ok(())
    }

    async fn receivers_by_webhook_path(&self, path: &str) -> Result<Vec<Receiver>, StoreError> {
        Ok(self
            .receivers
            .read()
            .await
            .iter()
            .filter(|r| r.webhook_path == path)
            .cloned()
            .collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.secrets
            .read()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                api_version: "v1".to_string(),
                kind: "Secret".to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}
