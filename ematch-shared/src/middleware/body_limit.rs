use axum::body::Body;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::errors::{AppError, ErrorCode};

/// JSON, text, and anything else without a more specific ceiling.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
/// Multipart form data (photo uploads).
pub const MULTIPART_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Byte ceiling keyed by Content-Type.
pub fn ceiling_for(content_type: Option<&str>) -> usize {
    match content_type {
        Some(ct) if ct.starts_with("multipart/form-data") => MULTIPART_BODY_LIMIT,
        _ => DEFAULT_BODY_LIMIT,
    }
}

/// Rejects oversized bodies before the handler runs. A declared
/// Content-Length over the ceiling fails fast with 413; bodies without a
/// length header are wrapped in a streaming limit at the same ceiling, so the
/// read aborts once the ceiling is crossed.
pub async fn body_limit_middleware(req: Request<Body>, next: Next) -> Response {
    if !matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
        return next.run(req).await;
    }

    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let ceiling = ceiling_for(content_type.as_deref());

    let declared_length = req
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared_length {
        if length > ceiling {
            tracing::warn!(
                content_length = length,
                ceiling = ceiling,
                content_type = content_type.as_deref().unwrap_or("-"),
                "request body exceeds size ceiling"
            );
            return AppError::new(
                ErrorCode::PayloadTooLarge,
                format!("request body exceeds the {ceiling}-byte limit"),
            )
            .into_response();
        }
        return next.run(req).await;
    }

    // No length header: count bytes as they stream in.
    let (parts, body) = req.into_parts();
    let limited = Body::new(http_body_util::Limited::new(body, ceiling));
    next.run(Request::from_parts(parts, limited)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::middleware::from_fn;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    fn app() -> Router {
        Router::new()
            .route("/test", post(dummy_handler))
            .layer(from_fn(body_limit_middleware))
    }

    #[test]
    fn multipart_gets_the_larger_ceiling() {
        assert_eq!(ceiling_for(Some("application/json")), DEFAULT_BODY_LIMIT);
        assert_eq!(ceiling_for(Some("text/plain")), DEFAULT_BODY_LIMIT);
        assert_eq!(ceiling_for(None), DEFAULT_BODY_LIMIT);
        assert_eq!(
            ceiling_for(Some("multipart/form-data; boundary=xyz")),
            MULTIPART_BODY_LIMIT
        );
    }

    #[tokio::test]
    async fn allows_small_json_bodies() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header("content-type", "application/json")
            .header("content-length", "1000")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_2mb_json_body_before_handler() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header("content-type", "application/json")
            .header("content-length", (2 * 1024 * 1024).to_string())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn multipart_allows_up_to_ten_megabytes() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header("content-type", "multipart/form-data; boundary=xyz")
            .header("content-length", (8 * 1024 * 1024).to_string())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn gets_pass_through_untouched() {
        let request = Request::builder()
            .uri("/test")
            .method(Method::GET)
            .body(Body::empty())
            .unwrap();

        // GET on a POST route: 405, not 413, since the limiter never ran
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
