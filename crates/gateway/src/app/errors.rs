//! Gateway error taxonomy and structured JSON responses.
//!
//! Every handler returns `Result<_, GatewayError>`; no unhandled failure
//! reaches the transport layer. Bodies are machine-readable:
//! `{ "error": <category>, "message": <text> }`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required environment value absent; fix by redeploying, not retrying.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Upstream unreachable or failed mid-request. The target URL is kept in
    /// the message for diagnosing misconfigured environments; gate this
    /// detail before exposing the gateway beyond internal deployments.
    #[error("upstream request failed: {message} (target: {target})")]
    Upstream { message: String, target: String },

    /// Event-stream upstream could not be reached; the relay attempt ends
    /// here rather than hanging silently.
    #[error("event stream upstream failed: {message} (target: {target})")]
    StreamUpstream { message: String, target: String },

    /// Upstream answered 2xx but the payload did not parse into its
    /// declared shape.
    #[error("unusable upstream payload: {0}")]
    UpstreamPayload(String),

    /// Client omitted a required query parameter; never forwarded upstream.
    #[error("missing required parameter: {0}")]
    MissingParam(&'static str),

    /// Request body was not valid JSON; rejected before any upstream call.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Authentication routes are served by the dedicated auth handler; the
    /// proxy refuses to forward them.
    #[error("authentication routes are not proxied")]
    ReservedPath,
}

impl GatewayError {
    pub fn upstream(err: &reqwest::Error, target: &str) -> Self {
        Self::Upstream {
            message: err.to_string(),
            target: target.to_string(),
        }
    }

    pub fn stream_upstream(err: &reqwest::Error, target: &str) -> Self {
        Self::StreamUpstream {
            message: err.to_string(),
            target: target.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let (status, category) = match &self {
            GatewayError::MissingConfig(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            GatewayError::Upstream { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "proxy_error"),
            GatewayError::StreamUpstream { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "sse_proxy_error")
            }
            GatewayError::UpstreamPayload(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "upstream_payload_error")
            }
            GatewayError::MissingParam(_) => (StatusCode::BAD_REQUEST, "missing_parameter"),
            GatewayError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
            GatewayError::ReservedPath => (StatusCode::NOT_FOUND, "reserved_path"),
        };
        json_error(status, category, self.to_string())
    }
}

pub fn json_error(
    status: StatusCode,
    category: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": category,
            "message": message.into(),
        })),
    )
        .into_response()
}
