//! Notification endpoints.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::Method;
use axum::response::Response;

use crate::app::errors::GatewayError;
use crate::app::proxy::relay_response;
use crate::app::GatewayState;

/// PATCH /api/notifications/:id/read — mark one notification read; upstream
/// status preserved either way.
pub async fn mark_read(
    Extension(state): Extension<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let base = state.backend_base()?;
    let target = format!("{base}/notifications/{id}/read");

    let upstream = state
        .request(Method::PATCH, &target)
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    Ok(relay_response(upstream))
}
