//! `mendline-client` — client-side data layer for the repair-service UI.
//!
//! Three pieces: a query cache with per-key in-flight deduplication and
//! versioned invalidation, a live-update subscriber holding one server-sent
//! event connection, and an explicitly-owned [`session::ClientSession`] that
//! wires the two together (any inbound event marks the cached queries stale
//! and triggers a background re-fetch).

pub mod cache;
pub mod live;
pub mod session;
pub mod sse;

pub use cache::{Fetcher, QueryCache, QueryKey};
pub use live::{subscribe, subscribe_with_retry, LiveUpdateHandle};
pub use session::ClientSession;
pub use sse::{SseMessage, SseParser};
