//! Webhook ingestion: request framing, routing, and the notify pipeline.

pub mod notifier;
pub mod providers;
pub mod router;

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::NotifierError;
use crate::store::ObjectStore;

/// An inbound webhook delivery, already stripped of transport concerns.
///
/// `headers` is a lowercase-keyed map so provider code never has to worry
/// about casing conventions that vary between upstreams (GitHub sends
/// `X-Hub-Signature-256`, GitLab sends `X-Gitlab-Token`, and so on).
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: bytes::Bytes,
}

impl IncomingRequest {
    pub fn new(path: impl Into<String>, headers: HashMap<String, String>, body: bytes::Bytes) -> Self {
        Self {
            path: path.into(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Parse the body as JSON, treated as the request's CEL `request.body`.
    ///
    /// A request whose `Content-Type` isn't `application/json` (parameters
    /// such as `;charset=utf-8` are ignored) is legal — generic receivers
    /// accept any body — and decodes to an empty mapping rather than being
    /// parsed at all.
    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        if !self.has_json_content_type() || self.body.is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        serde_json::from_slice(&self.body)
    }

    fn has_json_content_type(&self) -> bool {
        self.header("content-type")
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false)
    }
}

/// Run the full receive pipeline for one inbound delivery: look up the
/// Receiver, authenticate, check the event allowlist, and notify every
/// resource that passes the resource filter.
///
/// `reconcile_value` is the annotation value to stamp onto every notified
/// resource; callers generate it fresh per request (a timestamp, typically).
#[tracing::instrument(skip(store, request, cancellation), fields(path = %request.path))]
pub async fn handle_request(
    store: &Arc<dyn ObjectStore>,
    request: &IncomingRequest,
    reconcile_value: &str,
    cancellation: &CancellationToken,
) -> Result<notifier::NotifyOutcome, NotifierError> {
    let receiver = router::resolve(store, &request.path).await?;

    let secret = match &receiver.secret_ref {
        Some(secret_ref) => {
            let namespace = secret_ref
                .namespace
                .as_deref()
                .unwrap_or(&receiver.namespace);
            Some(
                store
                    .get_secret(namespace, &secret_ref.name)
                    .await
                    .map_err(|e| NotifierError::StoreError(e.to_string()))?,
            )
        }
        None => None,
    };

    providers::authenticate(receiver.provider_type, secret.as_ref(), request)?;

    if !receiver.events.is_empty() {
        match providers::event_type(receiver.provider_type, request) {
            Some(event) if receiver.events.iter().any(|e| e == &event) => {}
            Some(event) => {
                return Err(NotifierError::InvalidRequest(format!(
                    "event '{event}' is not in the receiver's allowed events"
                )))
            }
            None => {
                return Err(NotifierError::InvalidRequest(
                    "provider did not report an event type to check against the allowlist".to_string(),
                ))
            }
        }
    }

    let body = request
        .body_json()
        .map_err(|e| NotifierError::InvalidRequest(format!("request body is not valid JSON: {e}")))?;

    notifier::notify(store, &receiver, &body, reconcile_value, cancellation).await
}
