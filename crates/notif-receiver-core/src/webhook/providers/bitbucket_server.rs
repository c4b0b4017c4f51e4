//! `bitbucket-server` (Bitbucket Data Center): HMAC-SHA256 via `X-Hub-Signature`.
//!
//! Distinct from Bitbucket Cloud's `X-Hub-Signature-256` scheme (see
//! `bitbucket`); the two products are configured and versioned independently
//! upstream.

use crate::error::NotifierError;
use crate::receiver::Secret;
use crate::webhook::IncomingRequest;

use super::generic_hmac;

pub fn authenticate(secret: Option<&Secret>, request: &IncomingRequest) -> Result<(), NotifierError> {
    let token = super::required_token(secret)?;
    let signature = request
        .header("x-hub-signature")
        .ok_or_else(|| NotifierError::InvalidRequest("missing X-Hub-Signature header".to_string()))?;
    generic_hmac::verify(token, signature, &request.body)
}
