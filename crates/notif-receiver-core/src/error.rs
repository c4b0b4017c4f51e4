//! Unified error taxonomy for the receiver core.
//!
//! Every public operation in this crate ultimately produces a [`NotifierError`].
//! The variant chosen determines the HTTP status code the service binary maps
//! it to; see [`NotifierError::status_code`].

/// Top-level error for the webhook receive-and-notify pipeline.
///
/// Variants correspond 1:1 with the error taxonomy in the component design:
/// a missing receiver is [`NotFound`](Self::NotFound), a suspended or
/// not-ready receiver is [`NotReady`](Self::NotReady), request-shaped
/// problems are [`InvalidRequest`](Self::InvalidRequest), and everything
/// else the caller cannot fix by resubmitting is either
/// [`ConfigError`](Self::ConfigError), [`ExpressionError`](Self::ExpressionError),
/// or [`StoreError`](Self::StoreError).
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// No Receiver is registered for the requested webhook path.
    #[error("no receiver registered for this path")]
    NotFound,

    /// The matched Receiver is suspended or has not reported `Ready=True`.
    #[error("receiver is suspended or not ready")]
    NotReady,

    /// The request failed authentication, carried a disallowed event, or was
    /// otherwise malformed in a way the caller could fix by resending.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The Receiver's declarative configuration cannot be satisfied — an
    /// unresolvable resource reference, a missing `apiVersion`, a wildcard
    /// name without a label selector, or a missing secret key.
    #[error("receiver configuration error: {0}")]
    ConfigError(String),

    /// The resource filter failed to compile, evaluated to something other
    /// than a boolean, or raised a runtime error.
    #[error("expression evaluation failed: {0}")]
    ExpressionError(String),

    /// A transient failure reading or writing the object store.
    #[error("object store error: {0}")]
    StoreError(String),
}

impl NotifierError {
    /// Map this error to the HTTP status code the handler should return.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::NotReady => 503,
            Self::InvalidRequest(_) => 400,
            Self::ConfigError(_) | Self::ExpressionError(_) | Self::StoreError(_) => 500,
        }
    }

    /// Whether this failure should be logged at `error` level rather than `info`/`warn`.
    ///
    /// Client-correctable outcomes (404/503/400) are routine; everything the
    /// service maps to 500 indicates a configuration or infrastructure problem
    /// worth operator attention.
    pub fn is_operational_failure(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Short, stable category name for metrics and structured logging.
impl NotifierError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotReady => "not_ready",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ConfigError(_) => "config_error",
            Self::ExpressionError(_) => "expression_error",
            Self::StoreError(_) => "store_error",
        }
    }
}
