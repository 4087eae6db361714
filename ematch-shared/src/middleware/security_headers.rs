use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Default-deny CSP with explicit allowances for the storage and AI provider
/// origins the client talks to directly.
const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; \
     connect-src 'self' https://api.openai.com https://api.anthropic.com \
     https://api.deepgram.com https://api.replicate.com; \
     img-src 'self' data: https:; \
     style-src 'self' 'unsafe-inline'; \
     script-src 'self'; \
     frame-ancestors 'none'";

/// Attaches the fixed security header set to every response. Never blocks.
pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn dummy_handler() -> &'static str {
        "OK"
    }

    #[tokio::test]
    async fn attaches_headers_without_blocking() {
        let app = Router::new()
            .route("/test", get(dummy_handler))
            .layer(from_fn(security_headers_middleware));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert!(response.headers().contains_key("content-security-policy"));
    }
}
