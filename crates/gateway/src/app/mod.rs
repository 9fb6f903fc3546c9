//! Router assembly and shared per-process state.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Extension;
use axum::http::Method;
use axum::Router;
use tower::ServiceBuilder;

use crate::config::GatewayConfig;

pub mod errors;
pub mod proxy;
pub mod routes;

use self::errors::GatewayError;

/// Shared state injected into every handler: the config snapshot and one
/// pooled HTTP client for all upstream traffic.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub http: reqwest::Client,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { config, http }
    }

    /// Upstream base URL, or the structured configuration error.
    pub fn backend_base(&self) -> Result<&str, GatewayError> {
        self.config
            .backend_url
            .as_deref()
            .ok_or(GatewayError::MissingConfig("BACKEND_URL"))
    }

    /// Request builder with the configured upstream timeout applied.
    ///
    /// The SSE relay bypasses this and uses `http` directly; a long-lived
    /// stream must never be subject to the per-request timeout.
    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(timeout) = self.config.proxy_timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

/// Build the full application router.
///
/// Specialized `/api` handlers are matched first; everything else under
/// `/api` falls through to the generic relay.
pub fn build_app(config: GatewayConfig) -> Router {
    let state = Arc::new(GatewayState::new(config));

    Router::new()
        .nest("/api", routes::router())
        .fallback(proxy::relay_any)
        .layer(ServiceBuilder::new().layer(Extension(state)))
}
