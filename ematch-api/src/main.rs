use axum::http::HeaderValue;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod matching;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use ematch_shared::clients::anthropic::AnthropicClient;
use ematch_shared::clients::email::EmailClient;
use ematch_shared::clients::openai::OpenAiClient;
use ematch_shared::clients::redis::RedisClient;
use ematch_shared::clients::replicate::ReplicateClient;
use ematch_shared::clients::storage::StorageClient;
use ematch_shared::middleware::{
    body_limit_middleware, init_metrics, init_tracing, metrics_middleware,
    rate_limit_middleware, security_headers_middleware, timeout_middleware,
    RateLimitCategory, RateLimiter,
};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub redis: RedisClient,
    pub storage: StorageClient,
    pub email: Option<EmailClient>,
    pub openai: Option<OpenAiClient>,
    pub anthropic: Option<AnthropicClient>,
    pub replicate: Option<ReplicateClient>,
    pub metrics_handle: PrometheusHandle,
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const AI_TIMEOUT: Duration = Duration::from_secs(60);
const EMAIL_TIMEOUT: Duration = Duration::from_secs(15);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("ematch-api");

    let config = AppConfig::load()?;
    let port = config.port;

    // The token extractor in ematch-shared reads JWT_SECRET from the
    // environment; keep it in sync with the signing secret.
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let redis = RedisClient::connect(&config.redis_url).await?;
    let storage = StorageClient::new(
        &config.storage_endpoint,
        &config.storage_access_key,
        &config.storage_secret_key,
        &config.storage_bucket,
        &config.storage_public_url,
    )
    .await;

    let email = config
        .resend_api_key
        .as_deref()
        .map(|key| EmailClient::new(key, &config.email_from, &config.email_from_name));
    let openai = config.openai_api_key.as_deref().map(OpenAiClient::new);
    let anthropic = config.anthropic_api_key.as_deref().map(AnthropicClient::new);
    let replicate = config.replicate_api_token.as_deref().map(ReplicateClient::new);

    let metrics_handle = init_metrics();
    let limiter = Arc::new(RateLimiter::redis(redis.clone()));

    let state = Arc::new(AppState {
        db,
        config,
        redis,
        storage,
        email,
        openai,
        anthropic,
        replicate,
        metrics_handle,
    });

    let app = build_router(state.clone(), limiter);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "ematch-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

fn build_router(state: Arc<AppState>, limiter: Arc<RateLimiter>) -> Router {
    // Each group carries its own timeout and rate budget; the last layer
    // added wraps the rest, so within a group the timeout sits outside
    // the rate check.
    let auth_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .layer(from_fn_with_state(
            (limiter.clone(), RateLimitCategory::Auth),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(DEFAULT_TIMEOUT, timeout_middleware));

    let profile_write_routes = Router::new()
        .route("/profile", axum::routing::patch(routes::profile::update_profile))
        .route("/profile/onboarding", post(routes::profile::complete_onboarding))
        .route("/profile/photo", post(routes::photo::upload_photo))
        .layer(from_fn_with_state(
            (limiter.clone(), RateLimitCategory::ProfileUpdate),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(DEFAULT_TIMEOUT, timeout_middleware));

    let messaging_routes = Router::new()
        .route(
            "/conversations/:id/messages",
            post(routes::messages::send_message),
        )
        .route("/messages/:id/reactions", post(routes::messages::add_reaction))
        .layer(from_fn_with_state(
            (limiter.clone(), RateLimitCategory::Messaging),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(DEFAULT_TIMEOUT, timeout_middleware));

    let ai_routes = Router::new()
        .route("/ai/openai/chat", post(routes::ai::openai_chat))
        .route("/ai/anthropic/chat", post(routes::ai::anthropic_chat))
        .route("/ai/transcribe", post(routes::ai::transcribe))
        .route("/ai/deepgram", get(routes::ai::deepgram_key))
        .layer(from_fn_with_state(
            (limiter.clone(), RateLimitCategory::Api),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(AI_TIMEOUT, timeout_middleware));

    let image_routes = Router::new()
        .route("/images/generate", post(routes::images::generate_image))
        .layer(from_fn_with_state(
            (limiter.clone(), RateLimitCategory::Api),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(IMAGE_TIMEOUT, timeout_middleware));

    let email_routes = Router::new()
        .route("/notifications/email", post(routes::notifications::send_email))
        .layer(from_fn_with_state(
            (limiter.clone(), RateLimitCategory::Api),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(EMAIL_TIMEOUT, timeout_middleware));

    let api_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/profile", get(routes::profile::get_profile))
        .route("/discovery", get(routes::discovery::list_candidates))
        .route(
            "/discovery/compatibility/:id",
            get(routes::discovery::compatibility),
        )
        .route("/swipes/like", post(routes::swipes::like))
        .route("/swipes/dislike", post(routes::swipes::dislike))
        .route("/conversations", get(routes::conversations::list_conversations))
        .route(
            "/conversations/:id/messages",
            get(routes::messages::list_messages),
        )
        .route("/conversations/:id/read", post(routes::messages::mark_read))
        .route(
            "/conversations/:id/typing",
            axum::routing::put(routes::conversations::start_typing)
                .delete(routes::conversations::stop_typing)
                .get(routes::conversations::get_typing),
        )
        .layer(from_fn_with_state(
            (limiter, RateLimitCategory::Api),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(DEFAULT_TIMEOUT, timeout_middleware));

    let cors = cors_layer(&state.config.allowed_origins);

    // Outermost first: trace, metrics, security headers, CORS, body limit.
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .merge(auth_routes)
        .merge(profile_write_routes)
        .merge(messaging_routes)
        .merge(ai_routes)
        .merge(image_routes)
        .merge(email_routes)
        .merge(api_routes)
        .layer(from_fn(body_limit_middleware))
        .layer(cors)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
