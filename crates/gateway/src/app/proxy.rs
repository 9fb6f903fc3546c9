//! Generic streaming reverse proxy.
//!
//! Default path for any `/api/*` call without a specialized handler: forward
//! method, query and body verbatim to `{BACKEND_URL}/{rest}` and relay the
//! response back, re-framing the body over a fresh transport.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Extension, Request};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use uuid::Uuid;

use super::errors::{self, GatewayError};
use super::GatewayState;

/// Auth-provider routes live under this prefix and must never be blindly
/// forwarded to the backend.
const RESERVED_PREFIX: &str = "/api/auth";

/// Recomputed by the outbound transport; forwarding them verbatim would lie
/// about the new connection. `accept-encoding` is dropped too: the outbound
/// client does not decode compressed bodies, so the upstream must answer
/// with an identity body the browser can read after re-framing.
const STRIPPED_REQUEST_HEADERS: [&str; 4] =
    ["host", "connection", "content-length", "accept-encoding"];

/// The relayed body is re-framed (and re-encoded) by the outer transport;
/// keeping these would double-count or double-decode it.
const STRIPPED_RESPONSE_HEADERS: [&str; 3] =
    ["content-encoding", "content-length", "transfer-encoding"];

/// Fallback handler: relay anything under `/api` that no specialized route
/// claimed.
pub async fn relay_any(
    Extension(state): Extension<Arc<GatewayState>>,
    req: Request,
) -> Result<Response, GatewayError> {
    let path = req.uri().path();

    if path != "/api" && !path.starts_with("/api/") {
        return Ok(errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            "no such route",
        ));
    }
    if path == RESERVED_PREFIX || path.starts_with("/api/auth/") {
        return Err(GatewayError::ReservedPath);
    }

    let base = state.backend_base()?;
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(path);
    let target = format!("{base}{}", &path_and_query["/api".len()..]);

    let request_id = Uuid::now_v7();
    tracing::debug!(%request_id, method = %req.method(), %target, "relaying request upstream");

    let (parts, body) = req.into_parts();
    let mut builder = state
        .request(parts.method.clone(), &target)
        .headers(forward_headers(&parts.headers));

    // GET/HEAD carry no body; everything else is streamed, not buffered, so
    // large uploads do not double memory usage.
    if parts.method != Method::GET && parts.method != Method::HEAD {
        builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = builder
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    tracing::debug!(%request_id, status = %upstream.status(), "relaying upstream response");
    Ok(relay_response(upstream))
}

/// Copy of the inbound headers minus the per-connection ones.
pub fn forward_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if STRIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
            continue;
        }
        out.append(name, value.clone());
    }
    out
}

/// Relay an upstream response: same status, framing headers stripped, body
/// streamed through as it arrives.
pub fn relay_response(upstream: reqwest::Response) -> Response {
    let mut builder = Response::builder().status(upstream.status());
    for (name, value) in upstream.headers() {
        if STRIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        builder = builder.header(name.clone(), value.clone());
    }
    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .unwrap_or_else(|e| {
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "proxy_error",
                format!("failed to assemble relayed response: {e}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn per_connection_request_headers_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("gateway.local"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("content-length", HeaderValue::from_static("42"));
        headers.insert("accept-encoding", HeaderValue::from_static("gzip, br"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));
        headers.insert("cookie", HeaderValue::from_static("session=abc"));

        let forwarded = forward_headers(&headers);
        assert!(forwarded.get("host").is_none());
        assert!(forwarded.get("connection").is_none());
        assert!(forwarded.get("content-length").is_none());
        assert!(forwarded.get("accept-encoding").is_none());
        assert_eq!(forwarded.get("x-custom").unwrap(), "kept");
        assert_eq!(forwarded.get("cookie").unwrap(), "session=abc");
    }

    #[test]
    fn repeated_headers_survive_forwarding() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));

        let forwarded = forward_headers(&headers);
        assert_eq!(forwarded.get_all("accept").iter().count(), 2);
    }
}
