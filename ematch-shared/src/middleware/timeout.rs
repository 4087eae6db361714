use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::Duration;

use crate::errors::{AppError, ErrorCode};

/// Bounds handler latency for a route group. On expiry the caller gets a 408
/// in the standard error envelope; work the handler already handed off
/// elsewhere (a provider call in flight, a spawned task) is not chased down.
pub async fn timeout_middleware(
    State(limit): State<Duration>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                limit_secs = limit.as_secs_f64(),
                "request exceeded its group timeout"
            );
            AppError::new(
                ErrorCode::RequestTimeout,
                format!("request exceeded the {}s limit", limit.as_secs_f64()),
            )
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(from_fn_with_state(limit, timeout_middleware))
    }

    #[tokio::test]
    async fn slow_handler_gets_408_envelope() {
        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app(Duration::from_millis(50)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"]["code"], "E0010");
    }

    #[tokio::test]
    async fn fast_handler_is_untouched() {
        let request = Request::builder().uri("/fast").body(Body::empty()).unwrap();
        let response = app(Duration::from_millis(50)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
