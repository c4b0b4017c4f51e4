#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use notif_receiver_core::adapters::memory_store::InMemoryObjectStore;
use notif_receiver_core::receiver::{Condition, ProviderType, Receiver, ResourceRef, Secret, SecretRef};
use notif_receiver_core::{ObjectStore, RECONCILE_ANNOTATION};
use notif_receiver_service::AppState;
use sha2::Sha256;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub struct TestHarness {
    pub store: Arc<InMemoryObjectStore>,
    router: axum::Router,
}

impl TestHarness {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryObjectStore::new());
        let state = AppState {
            store: store.clone() as Arc<dyn notif_receiver_core::ObjectStore>,
            cancellation: CancellationToken::new(),
        };
        Self {
            store,
            router: notif_receiver_service::create_router(state),
        }
    }

    pub async fn post(&self, path: &str, headers: &[(&str, &str)], body: &[u8]) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("POST").uri(path);
        let declares_content_type = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if !declares_content_type {
            builder = builder.header("content-type", "application/json");
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body.to_vec())).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}

pub fn ready_condition() -> Condition {
    Condition {
        type_: "Ready".to_string(),
        status: "True".to_string(),
    }
}

pub fn base_receiver(webhook_path: &str, provider_type: ProviderType) -> Receiver {
    Receiver {
        name: "test-receiver".to_string(),
        namespace: "default".to_string(),
        provider_type,
        events: Vec::new(),
        secret_ref: None,
        resources: Vec::new(),
        resource_filter: None,
        suspend: false,
        webhook_path: webhook_path.to_string(),
        conditions: vec![ready_condition()],
    }
}

pub fn secret_ref(name: &str) -> SecretRef {
    SecretRef {
        name: name.to_string(),
        namespace: None,
    }
}

pub fn literal_resource(api_version: &str, kind: &str, namespace: &str, name: &str) -> ResourceRef {
    ResourceRef {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        match_labels: None,
    }
}

pub fn wildcard_resource(
    api_version: &str,
    kind: &str,
    namespace: &str,
    match_labels: Option<HashMap<String, String>>,
) -> ResourceRef {
    ResourceRef {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: Some("*".to_string()),
        namespace: Some(namespace.to_string()),
        match_labels,
    }
}

pub fn object_body(namespace: &str, name: &str, labels: &[(&str, &str)]) -> serde_json::Value {
    let labels: HashMap<&str, &str> = labels.iter().cloned().collect();
    serde_json::json!({
        "apiVersion": "kustomize.toolkit.fluxcd.io/v1",
        "kind": "Kustomization",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "labels": labels,
        }
    })
}

pub fn hmac_sha256_hex(key: &[u8], body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn secret_with_token(token: &str) -> Secret {
    Secret::new(HashMap::from([("token".to_string(), token.as_bytes().to_vec())]))
}

/// Since a successful webhook response carries no body, tests confirm a
/// notification happened by reading the annotation back off the store
/// instead of parsing a response payload.
pub async fn is_annotated(
    store: &InMemoryObjectStore,
    api_version: &str,
    kind: &str,
    namespace: &str,
    name: &str,
) -> bool {
    let object = match store.get(api_version, kind, namespace, name).await {
        Ok(object) => object,
        Err(_) => return false,
    };
    object
        .body
        .pointer("/metadata/annotations")
        .and_then(|annotations| annotations.get(RECONCILE_ANNOTATION))
        .is_some()
}
