//! Server-sent-event relay.
//!
//! One upstream streaming connection per inbound client connection, bytes
//! relayed as they arrive. Dropping the client response drops the upstream
//! connection with it; the relay holds no cross-connection state.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Extension, RawQuery};
use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;

use crate::app::errors::{self, GatewayError};
use crate::app::GatewayState;

/// GET /api/sse/notifications
pub async fn relay_notifications(
    Extension(state): Extension<Arc<GatewayState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, GatewayError> {
    let base = state.backend_base()?;
    let mut target = format!("{base}/sse/notifications");
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }

    // Deliberately not `state.request`: the per-request proxy timeout must
    // not apply to a persistent stream.
    let upstream = state
        .http
        .get(&target)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| GatewayError::stream_upstream(&e, &target))?;

    if !upstream.status().is_success() {
        return Err(GatewayError::StreamUpstream {
            message: format!("upstream answered {}", upstream.status()),
            target,
        });
    }

    tracing::debug!(%target, "event stream relay open");

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(upstream.bytes_stream()))
        .unwrap_or_else(|e| {
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "sse_proxy_error",
                format!("failed to assemble stream response: {e}"),
            )
        }))
}
