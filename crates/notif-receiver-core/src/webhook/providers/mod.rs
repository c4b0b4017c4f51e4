//! Per-provider authentication and event-type extraction.
//!
//! The provider set is closed and fixed (see [`crate::receiver::ProviderType`]),
//! so dispatch is a plain `match` rather than a trait object per provider —
//! there is no need to register providers at runtime, and the match makes
//! the one thing callers care about (which rule applies to which variant)
//! readable in one place.

mod bitbucket;
mod bitbucket_server;
mod generic_hmac;
mod github;
mod gitlab;
mod harbor;
mod passthrough;

use crate::error::NotifierError;
use crate::receiver::{ProviderType, Secret};
use crate::webhook::IncomingRequest;

/// Authenticate `request` against `secret` according to the rule for
/// `provider_type`. A provider with no authentication rule (the various
/// source-controlled registries that rely on network-level trust) always
/// succeeds.
pub fn authenticate(
    provider_type: ProviderType,
    secret: Option<&Secret>,
    request: &IncomingRequest,
) -> Result<(), NotifierError> {
    match provider_type {
        ProviderType::Generic => Ok(()),
        ProviderType::GenericHmac => generic_hmac::authenticate(secret, request),
        ProviderType::Github => github::authenticate(secret, request),
        ProviderType::Gitlab => gitlab::authenticate(secret, request),
        ProviderType::Bitbucket => bitbucket::authenticate(secret, request),
        ProviderType::BitbucketServer => bitbucket_server::authenticate(secret, request),
        ProviderType::Harbor => harbor::authenticate(secret, request),
        ProviderType::Dockerhub
        | ProviderType::Quay
        | ProviderType::Gcr
        | ProviderType::Acr
        | ProviderType::Nexus
        | ProviderType::Cdevents => passthrough::authenticate(),
    }
}

/// The upstream-reported event type for this request, if the provider sends
/// one. Receivers with a non-empty `events` allowlist only fire when this
/// returns `Some(event)` with `event` present in that list.
pub fn event_type(provider_type: ProviderType, request: &IncomingRequest) -> Option<String> {
    match provider_type {
        ProviderType::Github => request.header("x-github-event").map(str::to_string),
        ProviderType::Gitlab => request.header("x-gitlab-event").map(str::to_string),
        ProviderType::Bitbucket | ProviderType::BitbucketServer => {
            request.header("x-event-key").map(str::to_string)
        }
        ProviderType::Cdevents => request.header("ce-type").map(str::to_string),
        _ => None,
    }
}

/// A receiver with no `secret-ref`, or a `Secret` missing its `token` key, is
/// a request-shaped problem from the caller's point of view — the table in
/// section 4.2 maps it to `400`, not `500`: the receiver's own configuration
/// may be fine, but the request can never be authenticated without it.
fn missing_secret() -> NotifierError {
    NotifierError::InvalidRequest("receiver requires a secret-ref but none is configured".to_string())
}

fn required_token(secret: Option<&Secret>) -> Result<&[u8], NotifierError> {
    secret.and_then(Secret::token).ok_or_else(missing_secret)
}
