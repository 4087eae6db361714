use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::clients::redis::RedisClient;
use crate::errors::{AppError, ErrorCode};

/// Route groups with distinct fixed-window budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitCategory {
    /// General API traffic: 100 requests / 15 minutes.
    Api,
    /// Login and registration: 5 requests / hour.
    Auth,
    /// Message sends: 10 requests / minute.
    Messaging,
    /// Profile mutations and photo uploads: 20 requests / hour.
    ProfileUpdate,
}

impl RateLimitCategory {
    pub fn max(self) -> u64 {
        match self {
            Self::Api => 100,
            Self::Auth => 5,
            Self::Messaging => 10,
            Self::ProfileUpdate => 20,
        }
    }

    pub fn window_secs(self) -> i64 {
        match self {
            Self::Api => 15 * 60,
            Self::Auth => 3600,
            Self::Messaging => 60,
            Self::ProfileUpdate => 3600,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Auth => "auth",
            Self::Messaging => "msg",
            Self::ProfileUpdate => "prof",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    reset_at: i64,
}

/// Single-instance fixed-window store. Counters live only for the lifetime of
/// the process and are not shared across instances; deployments that scale
/// horizontally use the Redis backend instead.
#[derive(Default)]
pub struct MemoryWindowStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hit against `key` at `now` (epoch seconds). Returns the count
    /// within the current window; the window restarts once `reset_at` passes.
    pub fn hit(&self, key: &str, window_secs: i64, now: i64) -> u64 {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + window_secs,
        });

        if now >= entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + window_secs;
        } else {
            entry.count += 1;
        }

        entry.count
    }

    pub fn retry_after(&self, key: &str, now: i64) -> i64 {
        let windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows
            .get(key)
            .map(|w| (w.reset_at - now).max(0))
            .unwrap_or(0)
    }
}

enum Backend {
    /// Atomic INCR-with-EXPIRE; counters survive restarts and are shared
    /// across instances.
    Redis(RedisClient),
    Memory(MemoryWindowStore),
}

pub struct RateLimiter {
    backend: Backend,
}

impl RateLimiter {
    pub fn redis(client: RedisClient) -> Self {
        Self {
            backend: Backend::Redis(client),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryWindowStore::new()),
        }
    }

    /// Check one request from `client_ip` against the category's window.
    pub async fn check(
        &self,
        category: RateLimitCategory,
        client_ip: &str,
    ) -> Result<(), AppError> {
        let now = chrono::Utc::now().timestamp();
        let window = category.window_secs();

        match &self.backend {
            Backend::Redis(redis) => {
                // Discrete window buckets: all hits in the same bucket share a key.
                let bucket = now / window;
                let key = format!("rl:{}:{}:{}", category.prefix(), client_ip, bucket);
                let allowed = redis
                    .rate_limit_check(&key, category.max(), window as u64)
                    .await
                    .map_err(|e| AppError::internal(format!("rate limit backend: {e}")))?;
                if !allowed {
                    let retry_after = window - (now % window);
                    return Err(too_many_requests(retry_after));
                }
            }
            Backend::Memory(store) => {
                let key = format!("rl:{}:{}", category.prefix(), client_ip);
                let count = store.hit(&key, window, now);
                if count > category.max() {
                    return Err(too_many_requests(store.retry_after(&key, now)));
                }
            }
        }

        Ok(())
    }
}

fn too_many_requests(retry_after_secs: i64) -> AppError {
    AppError::with_details(
        ErrorCode::RateLimited,
        format!("too many requests, retry in {retry_after_secs}s"),
        serde_json::json!({ "retry_after_secs": retry_after_secs }),
    )
}

/// Best-effort client IP: first hop of `x-forwarded-for`, else "unknown".
/// Good enough for per-IP budgets behind a trusted proxy.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for one category. Stack one per route group:
/// `.layer(from_fn_with_state((limiter, category), rate_limit_middleware))`
pub async fn rate_limit_middleware(
    axum::extract::State((limiter, category)): axum::extract::State<(
        Arc<RateLimiter>,
        RateLimitCategory,
    )>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(req.headers());
    match limiter.check(category, &ip).await {
        Ok(()) => next.run(req).await,
        Err(err) => {
            tracing::warn!(ip = %ip, category = ?category, "rate limit exceeded");
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[test]
    fn window_allows_up_to_max_then_rejects() {
        let store = MemoryWindowStore::new();
        let max = RateLimitCategory::Auth.max();
        let window = RateLimitCategory::Auth.window_secs();
        let now = 1_000_000;

        for i in 1..=max {
            assert_eq!(store.hit("rl:auth:1.2.3.4", window, now), i);
        }
        // (max+1)th request inside the same window goes over budget
        assert_eq!(store.hit("rl:auth:1.2.3.4", window, now + 10), max + 1);
    }

    #[test]
    fn window_resets_after_expiry() {
        let store = MemoryWindowStore::new();
        let now = 1_000_000;

        for _ in 0..10 {
            store.hit("k", 60, now);
        }
        // First hit after reset_time starts a fresh window at count 1
        assert_eq!(store.hit("k", 60, now + 60), 1);
        assert_eq!(store.hit("k", 60, now + 61), 2);
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryWindowStore::new();
        let now = 1_000_000;

        assert_eq!(store.hit("rl:api:1.1.1.1", 60, now), 1);
        assert_eq!(store.hit("rl:api:2.2.2.2", 60, now), 1);
        assert_eq!(store.hit("rl:api:1.1.1.1", 60, now), 2);
    }

    #[test]
    fn extracts_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.7");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    #[tokio::test]
    async fn middleware_returns_429_over_budget() {
        let limiter = Arc::new(RateLimiter::in_memory());
        let app = Router::new()
            .route("/login", get(dummy_handler))
            .layer(axum::middleware::from_fn_with_state(
                (limiter, RateLimitCategory::Auth),
                rate_limit_middleware,
            ));

        for _ in 0..RateLimitCategory::Auth.max() {
            let req = Request::builder()
                .uri("/login")
                .header("x-forwarded-for", "198.51.100.9")
                .body(Body::empty())
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = Request::builder()
            .uri("/login")
            .header("x-forwarded-for", "198.51.100.9")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
