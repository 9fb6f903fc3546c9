//! Explicitly-owned client context.
//!
//! One `ClientSession` per application session: it owns the HTTP client, the
//! query cache and the (at most one) live-update connection, and is injected
//! into views instead of living as ambient global state. Created at session
//! start, `close()`d on navigation away; widgets share this instance rather
//! than opening their own stream.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use serde_json::Value;

use mendline_core::OrderView;

use crate::cache::{Fetcher, QueryCache, QueryKey};
use crate::live::{self, LiveUpdateHandle, OnMessage};

/// Resources marked stale on every inbound live-update message.
const LIVE_RESOURCES: [&str; 3] = ["orders", "notifications", "announcements"];

pub struct ClientSession {
    http: reqwest::Client,
    /// Same-origin API base, e.g. `https://repair.example.com/api`.
    api_base: String,
    cache: QueryCache,
    live: Mutex<Option<LiveUpdateHandle>>,
}

impl ClientSession {
    pub fn new(api_base: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            cache: QueryCache::default(),
            live: Mutex::new(None),
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Orders for one user, through the cache under `("orders", email)`.
    ///
    /// The gateway already shapes responses into order views; the payload is
    /// still validated into typed records here before anything renders it.
    pub async fn orders_for(&self, email: &str) -> anyhow::Result<Vec<OrderView>> {
        let key = QueryKey::scoped("orders", email);
        let http = self.http.clone();
        let url = format!("{}/orders/user", self.api_base);
        let email = email.to_string();

        let fetcher: Fetcher = Arc::new(move || {
            let http = http.clone();
            let url = url.clone();
            let email = email.clone();
            Box::pin(async move {
                let payload: Value = http
                    .get(&url)
                    .query(&[("email", email.as_str())])
                    .send()
                    .await
                    .context("order fetch failed")?
                    .error_for_status()
                    .context("order fetch rejected")?
                    .json()
                    .await
                    .context("order payload unreadable")?;
                let views: Vec<OrderView> = serde_json::from_value(payload)
                    .context("order payload did not match the expected shape")?;
                Ok(serde_json::to_value(views)?)
            })
        });

        self.cache.fetch_as(&key, fetcher).await
    }

    /// Currently active announcements, cached globally.
    pub async fn active_announcements(&self) -> anyhow::Result<Value> {
        let key = QueryKey::global("announcements");
        let http = self.http.clone();
        let url = format!("{}/announcements/active", self.api_base);

        let fetcher: Fetcher = Arc::new(move || {
            let http = http.clone();
            let url = url.clone();
            Box::pin(async move {
                http.get(&url)
                    .send()
                    .await
                    .context("announcement fetch failed")?
                    .error_for_status()
                    .context("announcement fetch rejected")?
                    .json()
                    .await
                    .context("announcement payload unreadable")
            })
        });

        let value = self.cache.fetch_with(&key, fetcher).await?;
        Ok((*value).clone())
    }

    /// Open the live-update stream, if not already open.
    ///
    /// Every inbound message invalidates the live resources wholesale; the
    /// payload is not inspected.
    pub fn start_live_updates(&self) {
        let mut live = self.live.lock().unwrap();
        if live.is_some() {
            return;
        }

        let cache = self.cache.clone();
        let on_message: OnMessage = Arc::new(move |_message| {
            for resource in LIVE_RESOURCES {
                cache.invalidate_resource(resource);
            }
        });

        let url = format!("{}/sse/notifications", self.api_base);
        *live = Some(live::subscribe(self.http.clone(), url, on_message));
    }

    /// Tear down the live connection. Idempotent; called on navigation away.
    pub fn close(&self) {
        if let Some(handle) = self.live.lock().unwrap().take() {
            handle.close();
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::extract::Query;
    use axum::http::header::CONTENT_TYPE;
    use axum::response::Response;
    use axum::routing::get;
    use axum::{Extension, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[derive(Clone, Default)]
    struct ApiStub {
        order_fetches: Arc<AtomicUsize>,
    }

    fn shaped_order(version: usize) -> Value {
        json!({
            "id": "ord-1",
            "created_at": "2026-03-02T09:30:00Z",
            "title": format!("셔츠 수선 v{version}"),
            "status": "REPAIRING",
            "status_label": "수선중",
            "step_index": 10,
            "images": []
        })
    }

    async fn stub_user_orders(
        Extension(stub): Extension<ApiStub>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        assert_eq!(params.get("email").map(String::as_str), Some("a@b.com"));
        let n = stub.order_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!([shaped_order(n)]))
    }

    /// One change notification, then a stream that stays open.
    async fn stub_sse() -> Response {
        let head = tokio_stream::iter(vec![Ok::<Bytes, Infallible>(Bytes::from(
            "data: changed\n\n",
        ))]);
        Response::builder()
            .header(CONTENT_TYPE, "text/event-stream")
            .body(Body::from_stream(head.chain(tokio_stream::pending())))
            .unwrap()
    }

    async fn spawn_api_stub() -> (String, ApiStub, tokio::task::JoinHandle<()>) {
        let stub = ApiStub::default();
        let app = Router::new()
            .route("/api/orders/user", get(stub_user_orders))
            .route("/api/sse/notifications", get(stub_sse))
            .layer(Extension(stub.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, stub, handle)
    }

    #[tokio::test]
    async fn repeated_reads_hit_the_cache() {
        let (base, stub, server) = spawn_api_stub().await;
        let session = ClientSession::new(base);

        let first = session.orders_for("a@b.com").await.unwrap();
        let second = session.orders_for("a@b.com").await.unwrap();

        assert_eq!(first[0].status_label, "수선중");
        assert_eq!(first[0].step_index, 10);
        assert_eq!(first[0].title, second[0].title);
        assert_eq!(stub.order_fetches.load(Ordering::SeqCst), 1);

        server.abort();
    }

    #[tokio::test]
    async fn live_update_invalidates_and_refreshes_orders() {
        let (base, stub, server) = spawn_api_stub().await;
        let session = ClientSession::new(base);

        let first = session.orders_for("a@b.com").await.unwrap();
        assert_eq!(first[0].title, "셔츠 수선 v1");

        session.start_live_updates();

        // The stream's "changed" cue triggers a background re-fetch.
        for _ in 0..200 {
            if stub.order_fetches.load(Ordering::SeqCst) >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(stub.order_fetches.load(Ordering::SeqCst) >= 2);

        for _ in 0..200 {
            let current = session.orders_for("a@b.com").await.unwrap();
            if current[0].title == "셔츠 수선 v2" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let refreshed = session.orders_for("a@b.com").await.unwrap();
        assert_eq!(refreshed[0].title, "셔츠 수선 v2");

        session.close();
        server.abort();
    }

    #[tokio::test]
    async fn starting_live_updates_twice_keeps_one_connection() {
        let (base, _stub, server) = spawn_api_stub().await;
        let session = ClientSession::new(base);

        session.start_live_updates();
        session.start_live_updates();
        assert!(session.live.lock().unwrap().is_some());

        session.close();
        assert!(session.live.lock().unwrap().is_none());

        server.abort();
    }
}
