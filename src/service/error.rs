//! Service error definitions.

use axum::http::StatusCode;
use thiserror::Error;

use crate::transport::TransportError;

/// Failures surfaced to the caller of `produce_response`.
///
/// Every other failure mode becomes a connection-refused envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The operation is neither a standard verb nor a registered extension.
    #[error("Method \"{}\" not allowed.", .method.to_uppercase())]
    MethodNotAllowed { method: String },

    /// The downstream answered with a body that is not JSON.
    #[error("downstream returned an undecodable {status} response: {source}")]
    Decode {
        status: StatusCode,
        content_type: Option<String>,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }
}

/// Failure reported by a verb executor or an extension handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Handler-specific failure; treated like a transport failure.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl HandlerError {
    pub fn handler(reason: impl Into<String>) -> Self {
        Self::Handler(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::method_not_allowed("option");
        assert_eq!(err.to_string(), "Method \"OPTION\" not allowed.");

        let err = HandlerError::handler("bad cbor");
        assert_eq!(err.to_string(), "handler failed: bad cbor");
    }
}
