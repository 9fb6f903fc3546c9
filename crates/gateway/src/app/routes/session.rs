//! Local session termination.
//!
//! Session issuance belongs to the external auth provider; the gateway only
//! clears its cookies. Every known cookie name variant is expired for both
//! the host-only scope and the configured public domain scope, since the
//! variant actually set depends on how the deployment was reached.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::routes::apply_no_cache;
use crate::app::GatewayState;

const SESSION_COOKIES: [&str; 4] = [
    "session",
    "session.sig",
    "auth.session-token",
    "__Secure-auth.session-token",
];

/// GET /api/logout — clear session cookies and bounce to the site root.
pub async fn logout(Extension(state): Extension<Arc<GatewayState>>) -> Response {
    let mut headers = HeaderMap::new();
    apply_no_cache(&mut headers);

    let domain = state.config.cookie_domain();
    for name in SESSION_COOKIES {
        append_expired_cookie(&mut headers, name, None);
        if let Some(domain) = domain.as_deref() {
            append_expired_cookie(&mut headers, name, Some(domain));
        }
    }

    tracing::info!("session cookies cleared");
    (headers, Redirect::to("/")).into_response()
}

fn append_expired_cookie(headers: &mut HeaderMap, name: &str, domain: Option<&str>) {
    let secure = if name.starts_with("__Secure-") {
        "; Secure"
    } else {
        ""
    };
    let domain = domain
        .map(|d| format!("; Domain={d}"))
        .unwrap_or_default();
    let cookie = format!(
        "{name}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly{secure}{domain}"
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(SET_COOKIE, value);
    }
}
