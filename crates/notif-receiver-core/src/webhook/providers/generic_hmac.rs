//! `generic-hmac`: caller-agnostic HMAC-SHA256 over the raw body.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::NotifierError;
use crate::receiver::Secret;
use crate::webhook::IncomingRequest;

type HmacSha256 = Hmac<Sha256>;

pub fn authenticate(secret: Option<&Secret>, request: &IncomingRequest) -> Result<(), NotifierError> {
    let token = super::required_token(secret)?;
    let signature = request
        .header("x-signature")
        .ok_or_else(|| NotifierError::InvalidRequest("missing X-Signature header".to_string()))?;

    verify(token, signature, &request.body)
}

pub(super) fn verify(key: &[u8], signature_header: &str, body: &[u8]) -> Result<(), NotifierError> {
    let hex_sig = signature_header.strip_prefix("sha256=").unwrap_or(signature_header);
    let expected = hex::decode(hex_sig)
        .map_err(|_| NotifierError::InvalidRequest("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| NotifierError::ConfigError(format!("invalid HMAC key: {e}")))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| NotifierError::InvalidRequest("signature mismatch".to_string()))
}

/// Shared by this module's own tests and the other HMAC-based providers
/// (`github`, `bitbucket`, `bitbucket-server`), all of which differ from
/// `generic-hmac` only in which header carries the signature.
#[cfg(test)]
pub(super) mod tests_support {
    use super::HmacSha256;
    use crate::webhook::IncomingRequest;
    use hmac::Mac;
    use std::collections::HashMap;

    pub fn signed_request(header_name: &str, key: &[u8], body: &[u8]) -> IncomingRequest {
        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(body);
        let sig = hex::encode(mac.finalize().into_bytes());
        let mut headers = HashMap::new();
        headers.insert(header_name.to_string(), format!("sha256={sig}"));
        IncomingRequest::new("/hook/test", headers, bytes::Bytes::copy_from_slice(body))
    }
}
