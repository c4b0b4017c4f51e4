//! `bitbucket` (Bitbucket Cloud): same HMAC-SHA256 scheme as `github`, via
//! `X-Hub-Signature-256`. Distinct from `bitbucket-server`, which signs with
//! the bare `X-Hub-Signature` header instead.

use crate::error::NotifierError;
use crate::receiver::Secret;
use crate::webhook::IncomingRequest;

use super::generic_hmac;

pub fn authenticate(secret: Option<&Secret>, request: &IncomingRequest) -> Result<(), NotifierError> {
    let token = super::required_token(secret)?;
    let signature = request.header("x-hub-signature-256").ok_or_else(|| {
        NotifierError::InvalidRequest("missing X-Hub-Signature-256 header".to_string())
    })?;
    generic_hmac::verify(token, signature, &request.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic_hmac::tests_support::signed_request;
    use std::collections::HashMap;

    #[test]
    fn accepts_valid_signature() {
        let secret = Secret::new(HashMap::from([("token".to_string(), b"shared-secret".to_vec())]));
        let request = signed_request("x-hub-signature-256", b"shared-secret", b"{}");
        assert!(authenticate(Some(&secret), &request).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let secret = Secret::new(HashMap::from([("token".to_string(), b"shared-secret".to_vec())]));
        let mut request = signed_request("x-hub-signature-256", b"shared-secret", b"{}");
        request.body = bytes::Bytes::from_static(b"{\"tampered\":true}");
        assert!(authenticate(Some(&secret), &request).is_err());
    }

    #[test]
    fn missing_secret_is_rejected_as_invalid_request_not_config_error() {
        let request = signed_request("x-hub-signature-256", b"shared-secret", b"{}");
        let err = authenticate(None, &request).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn secret_without_a_token_key_is_also_rejected_as_invalid_request() {
        let secret = Secret::new(HashMap::from([("username".to_string(), b"someone".to_vec())]));
        let request = signed_request("x-hub-signature-256", b"shared-secret", b"{}");
        let err = authenticate(Some(&secret), &request).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
