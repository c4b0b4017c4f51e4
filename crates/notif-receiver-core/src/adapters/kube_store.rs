//! Kubernetes-backed [`ObjectStore`].
//!
//! Receiver objects are read as [`DynamicObject`]s of a fixed, configured
//! group/version/kind so this crate carries no generated CRD types. Secrets
//! use the strongly typed `k8s-openapi` core/v1 type since its shape is
//! stable API surface, not a CRD the cluster operator controls.

use crate::receiver::{Condition, ProviderType, Receiver, ResourceRef, Secret as ReceiverSecret, SecretRef};
use crate::store::{ObjectRef, ObjectStore, StoreError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret as CoreSecret;
use kube::api::{Api, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams};
use kube::core::ApiResource;
use kube::Client;
use serde::Deserialize;
use std::collections::HashMap;

const FIELD_MANAGER: &str = "notif-receiver";

/// Group/version/kind under which `Receiver` custom resources are served.
///
/// The reconciler that owns the CRD schema is out of scope here; this crate
/// only needs enough of `ApiResource` to build a [`DynamicObject`] API handle.
#[derive(Debug, Clone)]
pub struct ReceiverGvk {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl Default for ReceiverGvk {
    fn default() -> Self {
        Self {
            group: "notification.toolkit.fluxcd.io".to_string(),
            version: "v1".to_string(),
            kind: "Receiver".to_string(),
            plural: "receivers".to_string(),
        }
    }
}

pub struct KubeObjectStore {
    client: Client,
    receiver_gvk: ReceiverGvk,
}

impl KubeObjectStore {
    pub fn new(client: Client, receiver_gvk: ReceiverGvk) -> Self {
        Self { client, receiver_gvk }
    }

    fn receiver_api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(
                &self.receiver_gvk.group,
                &self.receiver_gvk.version,
                &self.receiver_gvk.kind,
            ),
            &self.receiver_gvk.plural,
        )
    }

    /// Resolve `(api_version, kind)` to a namespaced [`DynamicObject`] handle
    /// via API discovery, since this crate has no generated types for the
    /// arbitrary resource kinds a `ResourceRef` can name.
    async fn dynamic_api(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
    ) -> Result<Api<DynamicObject>, StoreError> {
        let (group, version) = split_api_version(api_version);
        let gvk = GroupVersionKind::gvk(&group, &version, kind);
        let (resource, _capabilities) = kube::discovery::pinned_kind(&self.client, &gvk)
            .await
            .map_err(|e| StoreError::Backend(format!("discovery failed for {api_version}/{kind}: {e}")))?;
        Ok(Api::namespaced_with(self.client.clone(), namespace, &resource))
    }

    fn to_object_ref(obj: DynamicObject) -> Result<ObjectRef, StoreError> {
        let api_version = obj.types.as_ref().map(|t| t.api_version.clone()).unwrap_or_default();
        let kind = obj.types.as_ref().map(|t| t.kind.clone()).unwrap_or_default();
        let namespace = obj.metadata.namespace.clone().unwrap_or_default();
        let name = obj.metadata.name.clone().unwrap_or_default();
        let resource_version = obj.metadata.resource_version.clone();
        let body = serde_json::to_value(&obj)
            .map_err(|e| StoreError::Backend(format!("failed to serialize object: {e}")))?;
        Ok(ObjectRef {
            api_version,
            kind,
            namespace,
            name,
            resource_version,
            body,
        })
    }

    /// Convert a cluster `Receiver` object into this crate's flattened
    /// [`Receiver`]. `DynamicObject` keeps everything outside
    /// `apiVersion`/`kind`/`metadata` in its flattened `data` field, so
    /// `spec`/`status` are pulled out of there rather than from a
    /// whole-object re-serialize — a real `Receiver` nests its fields under
    /// `metadata`/`spec`/`status`, not at the top level this crate's
    /// `Receiver` type uses internally.
    fn receiver_from_dynamic(obj: &DynamicObject) -> Option<Receiver> {
        let name = obj.metadata.name.clone()?;
        let namespace = obj.metadata.namespace.clone()?;

        let spec: ReceiverSpecWire = serde_json::from_value(obj.data.get("spec")?.clone()).ok()?;
        let status: ReceiverStatusWire = match obj.data.get("status") {
            Some(status) => serde_json::from_value(status.clone()).ok()?,
            None => ReceiverStatusWire::default(),
        };
        let webhook_path = status.webhook_path?;

        Some(Receiver {
            name,
            namespace,
            provider_type: spec.provider_type,
            events: spec.events,
            secret_ref: spec.secret_ref,
            resources: spec.resources,
            resource_filter: spec.resource_filter,
            suspend: spec.suspend,
            webhook_path,
            conditions: status.conditions,
        })
    }
}

/// Wire shape of a `Receiver` custom resource's `spec` stanza.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiverSpecWire {
    #[serde(rename = "type")]
    provider_type: ProviderType,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    secret_ref: Option<SecretRef>,
    #[serde(default)]
    resources: Vec<ResourceRef>,
    #[serde(default)]
    resource_filter: Option<String>,
    #[serde(default)]
    suspend: bool,
}

/// Wire shape of a `Receiver` custom resource's `status` stanza. Absent
/// entirely (a freshly created object the reconciler hasn't touched yet) is
/// equivalent to an empty one — `webhook_path` being `None` then correctly
/// makes the object unroutable rather than a deserialize failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiverStatusWire {
    #[serde(default)]
    webhook_path: Option<String>,
    #[serde(default)]
    conditions: Vec<Condition>,
}

fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectRef, StoreError> {
        let api = self.dynamic_api(api_version, kind, namespace).await?;
        let obj = api.get(name).await.map_err(|e| match e {
            kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => StoreError::Backend(other.to_string()),
        })?;
        Self::to_object_ref(obj)
    }

    async fn list(
        &self,
        api_version: &str,
        kind: &str,
        namespace: &str,
        selector: Option<&HashMap<String, String>>,
    ) -> Result<Vec<ObjectRef>, StoreError> {
        let api = self.dynamic_api(api_version, kind, namespace).await?;
        let mut params = ListParams::default();
        if let Some(selector) = selector {
            let label_selector = selector
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            params = params.labels(&label_selector);
        }
        let list = api
            .list(&params)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        list.items
            .into_iter()
            .map(Self::to_object_ref)
            .collect()
    }

    async fn annotate(&self, object: &ObjectRef, key: &str, value: &str) -> Result<(), StoreError> {
        let api = self
            .dynamic_api(&object.api_version, &object.kind, &object.namespace)
            .await?;
        let patch = serde_json::json!({
            "metadata": {
                "annotations": { key: value }
            }
        });
        api.patch(
            &object.name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(patch),
        )
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn receivers_by_webhook_path(&self, path: &str) -> Result<Vec<Receiver>, StoreError> {
        let resource = self.receiver_api_resource();
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(list
            .items
            .iter()
            .filter_map(Self::receiver_from_dynamic)
            .filter(|r| r.webhook_path == path)
            .collect())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<ReceiverSecret, StoreError> {
        let api: Api<CoreSecret> = Api::namespaced(self.client.clone(), namespace);
        let secret = api.get(name).await.map_err(|e| match e {
            kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound {
                api_version: "v1".to_string(),
                kind: "Secret".to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => StoreError::Backend(other.to_string()),
        })?;
        let data: HashMap<String, Vec<u8>> = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect();
        Ok(ReceiverSecret::new(data))
    }
}
