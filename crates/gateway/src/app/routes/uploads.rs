//! Upload passthrough.
//!
//! Multipart form bodies are opaque here: the payload is streamed upstream
//! byte-for-byte with its original `content-type` (boundary included), never
//! parsed or re-encoded.

use std::sync::Arc;

use axum::extract::{Extension, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::response::Response;

use crate::app::errors::GatewayError;
use crate::app::proxy::relay_response;
use crate::app::GatewayState;

/// POST /api/upload — single `file` field; responds with the upstream
/// `{ "url": ... }` body.
pub async fn upload(
    Extension(state): Extension<Arc<GatewayState>>,
    req: Request,
) -> Result<Response, GatewayError> {
    let base = state.backend_base()?;
    let target = format!("{base}/upload");

    let content_type = req.headers().get(CONTENT_TYPE).cloned();

    let mut builder = state
        .request(Method::POST, &target)
        .body(reqwest::Body::wrap_stream(req.into_body().into_data_stream()));
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }

    let upstream = builder
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    Ok(relay_response(upstream))
}
