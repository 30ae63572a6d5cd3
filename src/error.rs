//! Error types and failure classification for the gateway.
//!
//! Every network or parse failure is converted into a [`GatewayError`]
//! before it reaches the caller; nothing in this crate panics on a bad
//! response. The classifier functions implement one mapping shared by
//! both backends:
//!
//! - connection-level failure → [`GatewayError::Unreachable`]
//! - request deadline exceeded → [`GatewayError::Timeout`]
//! - HTTP 5xx or an `error.code == 500` body → [`GatewayError::ServerUnavailable`]
//! - any other `error` body → [`GatewayError::ProviderRejected`]
//! - unparseable expected-success body → [`GatewayError::MalformedResponse`]
//!
//! The two stream-only kinds ([`GatewayError::DecodeError`],
//! [`GatewayError::StreamAborted`]) are produced by the decoders in
//! [`crate::llm::streaming`].

use reqwest::StatusCode;
use serde_json::Value;

/// Broad failure category, used by callers to pick user messaging.
///
/// Only the category is needed to decide what to show (for example,
/// `ServerUnavailable` gets a "try again later" hint); the full
/// [`GatewayError`] carries the backend code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unreachable,
    Timeout,
    Unauthorized,
    ProviderRejected,
    ServerUnavailable,
    MalformedResponse,
    DecodeError,
    StreamAborted,
    Configuration,
}

/// A classified gateway failure.
///
/// `code` fields carry the backend-reported application error code when
/// one was present in the response body.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// No connection to the endpoint could be established.
    #[error("endpoint unreachable: {message}")]
    Unreachable { message: String },

    /// The request exceeded its deadline.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// The backend rejected the credential.
    #[error("credential rejected: {message}")]
    Unauthorized { code: Option<i64>, message: String },

    /// The backend reported an application-level error.
    #[error("provider rejected request: {message}")]
    ProviderRejected { code: Option<i64>, message: String },

    /// The backend itself is down or overloaded (5xx class).
    #[error("provider unavailable: {message}")]
    ServerUnavailable { code: Option<i64>, message: String },

    /// A response that should have succeeded had an unexpected shape.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// One stream frame failed to decode. Non-fatal: the stream
    /// continues with the next frame.
    #[error("failed to decode stream frame: {message}")]
    DecodeError { message: String },

    /// The transport failed mid-stream. Terminal for that stream only;
    /// fragments already yielded remain valid.
    #[error("stream aborted: {message}")]
    StreamAborted { message: String },

    /// The provider could not be constructed from its configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl GatewayError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Unreachable { .. } => ErrorKind::Unreachable,
            GatewayError::Timeout { .. } => ErrorKind::Timeout,
            GatewayError::Unauthorized { .. } => ErrorKind::Unauthorized,
            GatewayError::ProviderRejected { .. } => ErrorKind::ProviderRejected,
            GatewayError::ServerUnavailable { .. } => ErrorKind::ServerUnavailable,
            GatewayError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            GatewayError::DecodeError { .. } => ErrorKind::DecodeError,
            GatewayError::StreamAborted { .. } => ErrorKind::StreamAborted,
            GatewayError::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// The backend-reported error code, when the response carried one.
    pub fn code(&self) -> Option<i64> {
        match self {
            GatewayError::Unauthorized { code, .. }
            | GatewayError::ProviderRejected { code, .. }
            | GatewayError::ServerUnavailable { code, .. } => *code,
            _ => None,
        }
    }

    /// The human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Unreachable { message }
            | GatewayError::Timeout { message }
            | GatewayError::Unauthorized { message, .. }
            | GatewayError::ProviderRejected { message, .. }
            | GatewayError::ServerUnavailable { message, .. }
            | GatewayError::MalformedResponse { message }
            | GatewayError::DecodeError { message }
            | GatewayError::StreamAborted { message }
            | GatewayError::Configuration { message } => message,
        }
    }
}

/// Map a transport-level `reqwest` failure to a typed error.
pub fn classify_transport(err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout {
            message: err.to_string(),
        }
    } else {
        GatewayError::Unreachable {
            message: err.to_string(),
        }
    }
}

/// Classify a non-success HTTP response.
///
/// The body is inspected for an `error` field; both the OpenRouter
/// shape (`{"error": {"code", "message"}}`) and the Ollama shape
/// (`{"error": "text"}`) are understood.
pub fn classify_http_failure(status: StatusCode, body: &str) -> GatewayError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let reported = parsed
        .as_ref()
        .and_then(|json| json.get("error"))
        .map(error_details);

    match reported {
        Some((code, message)) => {
            if status.is_server_error() || code == Some(500) {
                GatewayError::ServerUnavailable { code, message }
            } else {
                GatewayError::ProviderRejected { code, message }
            }
        }
        None => {
            let code = Some(i64::from(status.as_u16()));
            let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
            if status.is_server_error() {
                GatewayError::ServerUnavailable { code, message }
            } else {
                GatewayError::ProviderRejected { code, message }
            }
        }
    }
}

/// Pull `(code, message)` out of an `error` body field.
pub(crate) fn error_details(error: &Value) -> (Option<i64>, String) {
    match error {
        Value::String(text) => (None, text.clone()),
        Value::Object(fields) => {
            let code = fields.get("code").and_then(Value::as_i64);
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            (code, message)
        }
        other => (None, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_500_with_error_body_is_server_unavailable() {
        let err = classify_http_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":{"code":500,"message":"down"}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
        assert_eq!(err.code(), Some(500));
        assert_eq!(err.message(), "down");
    }

    #[test]
    fn error_code_500_is_server_unavailable_regardless_of_status() {
        let err = classify_http_failure(
            StatusCode::OK,
            r#"{"error":{"code":500,"message":"overloaded"}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
    }

    #[test]
    fn non_500_error_body_is_provider_rejected() {
        let err = classify_http_failure(
            StatusCode::PAYMENT_REQUIRED,
            r#"{"error":{"code":402,"message":"quota exhausted"}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::ProviderRejected);
        assert_eq!(err.code(), Some(402));
        assert_eq!(err.message(), "quota exhausted");
    }

    #[test]
    fn string_error_body_keeps_its_text() {
        let err = classify_http_failure(
            StatusCode::NOT_FOUND,
            r#"{"error":"model 'nope' not found"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::ProviderRejected);
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), "model 'nope' not found");
    }

    #[test]
    fn unparseable_5xx_body_is_still_server_unavailable() {
        let err = classify_http_failure(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.kind(), ErrorKind::ServerUnavailable);
        assert_eq!(err.code(), Some(502));
    }

    #[test]
    fn unparseable_4xx_body_is_provider_rejected() {
        let err = classify_http_failure(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(err.kind(), ErrorKind::ProviderRejected);
        assert_eq!(err.code(), Some(400));
    }
}
