//! Announcement view-tracking endpoints.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::Method;
use axum::response::Response;

use crate::app::errors::GatewayError;
use crate::app::proxy::relay_response;
use crate::app::routes::apply_no_cache;
use crate::app::GatewayState;

/// POST /api/announcements/:id/view
pub async fn record_view(
    Extension(state): Extension<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    forward(&state, Method::POST, format!("announcements/{id}/view"), false).await
}

/// GET /api/announcements/:id/viewed/:user_id
pub async fn viewed_by(
    Extension(state): Extension<Arc<GatewayState>>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    forward(
        &state,
        Method::GET,
        format!("announcements/{id}/viewed/{user_id}"),
        true,
    )
    .await
}

/// GET /api/announcements/active
pub async fn active(
    Extension(state): Extension<Arc<GatewayState>>,
) -> Result<Response, GatewayError> {
    forward(&state, Method::GET, "announcements/active".to_string(), true).await
}

async fn forward(
    state: &GatewayState,
    method: Method,
    rest: String,
    no_cache: bool,
) -> Result<Response, GatewayError> {
    let base = state.backend_base()?;
    let target = format!("{base}/{rest}");

    let upstream = state
        .request(method, &target)
        .send()
        .await
        .map_err(|e| GatewayError::upstream(&e, &target))?;

    let mut response = relay_response(upstream);
    if no_cache {
        apply_no_cache(response.headers_mut());
    }
    Ok(response)
}
