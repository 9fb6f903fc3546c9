//! Order endpoints: listing (with response shaping), creation, per-user
//! lookup.
//!
//! List responses are parsed into typed order records at this boundary and
//! returned with the mapped status label and step index attached, so no
//! untyped backend JSON reaches the rendering layer.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Extension, Query, RawQuery};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use mendline_core::order::parse_orders;

use crate::app::errors::GatewayError;
use crate::app::routes::apply_no_cache;
use crate::app::GatewayState;

#[derive(Debug, Deserialize)]
pub struct UserOrdersQuery {
    pub email: Option<String>,
}

/// GET /api/orders
pub async fn list_orders(
    Extension(state): Extension<Arc<GatewayState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, GatewayError> {
    let base = state.backend_base()?;
    let mut target = format!("{base}/orders");
    if let Some(query) = query {
        target.push('?');
        target.push_str(&query);
    }

    let upstream = state
        .request(Method::GET, &target)
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    shaped_order_response(upstream, &target).await
}

/// GET /api/orders/user?email=
///
/// The identifying parameter is required; an under-specified query is
/// rejected here instead of being forwarded.
pub async fn orders_for_user(
    Extension(state): Extension<Arc<GatewayState>>,
    Query(params): Query<UserOrdersQuery>,
) -> Result<Response, GatewayError> {
    let email = params.email.ok_or(GatewayError::MissingParam("email"))?;

    let base = state.backend_base()?;
    let target = format!("{base}/orders/user");

    let upstream = state
        .request(Method::GET, &target)
        .query(&[("email", email.as_str())])
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    shaped_order_response(upstream, &target).await
}

/// POST /api/orders
///
/// JSON body forwarded as-is; a body that is not JSON gets the same
/// structured error shape as every other failure rather than the
/// extractor's plain-text rejection. A non-success upstream answer keeps
/// its status code; the message is the upstream text when readable, a
/// generic fallback otherwise.
pub async fn create_order(
    Extension(state): Extension<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let body: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

    let base = state.backend_base()?;
    let target = format!("{base}/orders");

    let upstream = state
        .request(Method::POST, &target)
        .json(&body)
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    let status = upstream.status();
    if status.is_success() {
        return Ok(crate::app::proxy::relay_response(upstream));
    }

    let message = match upstream.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => "repair request could not be created".to_string(),
    };
    tracing::warn!(%status, "order creation rejected upstream");

    Ok((
        status,
        Json(serde_json::json!({
            "error": "upstream_error",
            "message": message,
        })),
    )
        .into_response())
}

/// Shape a 2xx order-list payload into typed views; relay other statuses
/// with a generic error body, never silently converted to success.
async fn shaped_order_response(
    upstream: reqwest::Response,
    target: &str,
) -> Result<Response, GatewayError> {
    let status = upstream.status();
    if !status.is_success() {
        return Ok((
            status,
            Json(serde_json::json!({
                "error": "upstream_error",
                "message": "order lookup failed",
            })),
        )
            .into_response());
    }

    let payload: serde_json::Value = upstream
        .json()
        .await
        .map_err(|e| GatewayError::upstream(&e, target))?;
    let views = parse_orders(payload).map_err(|e| GatewayError::UpstreamPayload(e.to_string()))?;

    let mut response = (StatusCode::OK, Json(views)).into_response();
    apply_no_cache(response.headers_mut());
    Ok(response)
}
