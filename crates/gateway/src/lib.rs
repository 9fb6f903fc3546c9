//! `mendline-gateway` — same-origin HTTP surface for the repair-service web
//! client.
//!
//! Thin presentation/routing layer over the external backend API: a generic
//! streaming reverse proxy for most calls, a handful of specialized handlers
//! with extra validation and response shaping, and a server-sent-event relay
//! for live order updates. The backend owns all business data; nothing here
//! survives a single request except the shared HTTP client and config.

pub mod app;
pub mod config;

pub use app::build_app;
pub use config::GatewayConfig;
