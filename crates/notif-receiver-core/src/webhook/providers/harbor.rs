//! `harbor`: verbatim token comparison via `Authorization`.

use subtle::ConstantTimeEq;

use crate::error::NotifierError;
use crate::receiver::Secret;
use crate::webhook::IncomingRequest;

pub fn authenticate(secret: Option<&Secret>, request: &IncomingRequest) -> Result<(), NotifierError> {
    let token = super::required_token(secret)?;
    let provided = request
        .header("authorization")
        .ok_or_else(|| NotifierError::InvalidRequest("missing Authorization header".to_string()))?;

    if token.ct_eq(provided.as_bytes()).into() {
        Ok(())
    } else {
        Err(NotifierError::InvalidRequest("token mismatch".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request_with_token(token: &str) -> IncomingRequest {
        let mut headers = HashMap::new();
        headers.insert("authorization".to_string(), token.to_string());
        IncomingRequest::new("/hook/test", headers, bytes::Bytes::new())
    }

    #[test]
    fn accepts_matching_token() {
        let secret = Secret::new(HashMap::from([("token".to_string(), b"shared-secret".to_vec())]));
        let request = request_with_token("shared-secret");
        assert!(authenticate(Some(&secret), &request).is_ok());
    }

    #[test]
    fn rejects_mismatched_token() {
        let secret = Secret::new(HashMap::from([("token".to_string(), b"shared-secret".to_vec())]));
        let request = request_with_token("wrong-secret");
        assert!(authenticate(Some(&secret), &request).is_err());
    }

    #[test]
    fn missing_secret_is_rejected_as_invalid_request_not_config_error() {
        let request = request_with_token("shared-secret");
        let err = authenticate(None, &request).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn secret_without_a_token_key_is_also_rejected_as_invalid_request() {
        let secret = Secret::new(HashMap::from([("username".to_string(), b"someone".to_vec())]));
        let request = request_with_token("shared-secret");
        let err = authenticate(Some(&secret), &request).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
