//! Path lookup and readiness gating.

use std::sync::Arc;

use crate::error::NotifierError;
use crate::receiver::Receiver;
use crate::store::ObjectStore;

/// Resolve the single Receiver registered for `path`.
///
/// `webhook_path` is expected to be unique; if the store ever reports more
/// than one match (a reconciler bug, or a race during a rename) this treats
/// it as a configuration error rather than guessing which one the caller
/// meant.
pub async fn resolve(store: &Arc<dyn ObjectStore>, path: &str) -> Result<Receiver, NotifierError> {
    let mut matches = store
        .receivers_by_webhook_path(path)
        .await
        .map_err(|e| NotifierError::StoreError(e.to_string()))?;

    match matches.len() {
        0 => Err(NotifierError::NotFound),
        1 => {
            let receiver = matches.remove(0);
            if receiver.is_ready() {
                Ok(receiver)
            } else {
                Err(NotifierError::NotReady)
            }
        }
        _ => Err(NotifierError::ConfigError(format!(
            "webhook path '{path}' resolved to {} receivers, expected exactly one",
            matches.len()
        ))),
    }
}
