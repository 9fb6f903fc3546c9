//! Specialized `/api` handlers layered over the generic proxy.

use axum::http::header::{CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA};
use axum::routing::{get, patch, post};
use axum::Router;

pub mod announcements;
pub mod notifications;
pub mod orders;
pub mod session;
pub mod stream;
pub mod uploads;

/// Router for the `/api` surface. Anything not matched here falls through to
/// the generic relay.
pub fn router() -> Router {
    Router::new()
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route("/orders/user", get(orders::orders_for_user))
        .route("/upload", post(uploads::upload))
        .route("/notifications/:id/read", patch(notifications::mark_read))
        .route("/announcements/:id/view", post(announcements::record_view))
        .route(
            "/announcements/:id/viewed/:user_id",
            get(announcements::viewed_by),
        )
        .route("/announcements/active", get(announcements::active))
        .route("/sse/notifications", get(stream::relay_notifications))
        .route("/logout", get(session::logout))
}

/// Order/notification state changes frequently; any intermediary cache
/// serving a stale copy would show the wrong workflow stage.
pub(crate) fn apply_no_cache(headers: &mut HeaderMap) {
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
}
