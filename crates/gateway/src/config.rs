//! Environment-driven gateway configuration.
//!
//! Read once at startup. The upstream base URL is deliberately optional here:
//! a missing `BACKEND_URL` is surfaced as a structured 500 on each request
//! that needs it, naming the variable, rather than panicking at boot or
//! silently defaulting to an unsafe target.

use std::env;
use std::time::Duration;

use tracing::{info, warn};

/// Default per-request timeout for non-streaming upstream calls, seconds.
const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Upstream backend base URL, e.g. `http://backend:4000`.
    pub backend_url: Option<String>,
    /// Browser-facing base URL; also the source of the cookie domain scope
    /// used by logout.
    pub public_api_url: Option<String>,
    /// Third-party payment-widget client key (exposed to the browser).
    pub payment_client_key: Option<String>,
    /// Identity-provider credentials. The gateway never uses these itself;
    /// auth routes are reserved for the dedicated handler.
    pub auth_client_id: Option<String>,
    pub auth_client_secret: Option<String>,
    pub port: u16,
    /// Upstream timeout for non-streaming proxying. `None` disables it.
    /// Never applied to the SSE relay.
    pub proxy_timeout: Option<Duration>,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let backend_url = optional("BACKEND_URL").map(|url| {
            url.trim_end_matches('/').to_string()
        });
        if backend_url.is_none() {
            warn!("BACKEND_URL not set; proxied requests will fail with a configuration error");
        }

        Self {
            backend_url,
            public_api_url: optional("PUBLIC_API_URL"),
            payment_client_key: optional("PAYMENT_CLIENT_KEY"),
            auth_client_id: optional("AUTH_CLIENT_ID"),
            auth_client_secret: optional("AUTH_CLIENT_SECRET"),
            port: parse_or("PORT", 8080),
            proxy_timeout: proxy_timeout_from_env(),
        }
    }

    /// Domain scope for session cookies, derived from the public URL:
    /// `https://repair.example.com/...` becomes `.repair.example.com`.
    pub fn cookie_domain(&self) -> Option<String> {
        let url = self.public_api_url.as_deref()?;
        let host = url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split(['/', ':'])
            .next()?;
        if host.is_empty() {
            return None;
        }
        Some(format!(".{host}"))
    }
}

fn optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match optional(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("invalid {key} value {raw:?}, using default");
            default
        }),
        None => default,
    }
}

fn proxy_timeout_from_env() -> Option<Duration> {
    let secs: u64 = parse_or("PROXY_TIMEOUT_SECS", DEFAULT_PROXY_TIMEOUT_SECS);
    if secs == 0 {
        info!("PROXY_TIMEOUT_SECS=0, upstream timeout disabled");
        return None;
    }
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_domain_is_derived_from_public_url() {
        let config = GatewayConfig {
            public_api_url: Some("https://repair.example.com/app".to_string()),
            ..Default::default()
        };
        assert_eq!(config.cookie_domain().as_deref(), Some(".repair.example.com"));
    }

    #[test]
    fn cookie_domain_ignores_port() {
        let config = GatewayConfig {
            public_api_url: Some("http://localhost:3000".to_string()),
            ..Default::default()
        };
        assert_eq!(config.cookie_domain().as_deref(), Some(".localhost"));
    }

    #[test]
    fn cookie_domain_absent_without_public_url() {
        assert_eq!(GatewayConfig::default().cookie_domain(), None);
    }
}
