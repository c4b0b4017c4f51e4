//! `gitlab`: verbatim token comparison via `X-Gitlab-Token`.

use subtle::ConstantTimeEq;

use crate::error::NotifierError;
use crate::receiver::Secret;
use crate::webhook::IncomingRequest;

pub fn authenticate(secret: Option<&Secret>, request: &IncomingRequest) -> Result<(), NotifierError> {
    let token = super::required_token(secret)?;
    let provided = request
        .header("x-gitlab-token")
        .ok_or_else(|| NotifierError::InvalidRequest("missing X-Gitlab-Token header".to_string()))?;

    if token.ct_eq(provided.as_bytes()).into() {
        Ok(())
    } else {
        Err(NotifierError::InvalidRequest("token mismatch".to_string()))
    }
}
