//! Object store abstraction.
//!
//! The core never talks to Kubernetes (or any other backing store) directly;
//! it depends only on this trait. Production deployments supply a
//! [`adapters::kube_store::KubeObjectStore`](crate::adapters::kube_store::KubeObjectStore);
//! tests supply [`adapters::memory_store::InMemoryObjectStore`](crate::adapters::memory_store::InMemoryObjectStore).

use crate::receiver::Receiver;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// A candidate resource as a generic JSON attribute map.
///
/// The serialization contract is fixed: `apiVersion`, `kind`, and `metadata`
/// (with nested `metadata.name`, `metadata.namespace`, `metadata.labels`,
/// `metadata.annotations`) must be present at the top level exactly as a
/// Kubernetes-style object would serialize them. This is also the shape
/// exposed to the expression evaluator as the `resource` variable.
#[derive(Debug, Clone)]
pub struct ObjectRef {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    /// Opaque version token used for optimistic-concurrency updates.
    pub resource_version: Option<String>,
    /// Full JSON body, including `metadata.labels`/`metadata.annotations`.
    pub body: Value,
}

impl ObjectRef {
    pub fn labels(&self) -> HashMap<String, String> {
        self.body
            .pointer("/metadata/labels")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A `matchLabels`-style selector: every key/value pair must match exactly.
pub fn labels_match(selector: &HashMap<String, String>, candidate: &HashMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| candidate.get(k).is_some_and(|cv| cv == v))
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {api_version}/{kind} {namespace}/{name}")]
    NotFound {
        api_version: String,
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("more than one object matched a lookup expected to be unique")]
    Ambiguous,

    #[error("optimistic concurrency conflict updating {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Typed access to the persisted object graph.
///
/// Implementors must expose a secondary index over `Receiver` objects keyed
/// by `status.webhookPath` so [`list_by_index`](Self::list_by_index) is O(1)
/// amortized; a linear scan is acceptable for small fleets but must still be
/// exposed through this same call.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch exactly one object. `NotFound` is returned when absent.
    async fn get(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectRef, StoreError>;

    /// List every object of `(api_version, kind)` in `namespace`, optionally
    /// narrowed by a `matchLabels` selector.
    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        selector: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ObjectRef>, StoreError>;

    /// Set a single annotation on `object` and persist the change.
    async fn annotate(&self, object: &ObjectRef, key: &str, value: &str) -> Result<(), StoreError>;

    /// Resolve Receivers by secondary index, keyed on `status.webhookPath`.
    async fn receivers_by_webhook_path(&self, path: &str) -> Result<Vec<Receiver>, StoreError>;

    /// Fetch the Secret named by a receiver's `secret-ref`.
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<crate::receiver::Secret, StoreError>;
}
