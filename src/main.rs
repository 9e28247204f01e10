use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use nova_score_api::artifact::load_model;
use nova_score_api::config::Config;
use nova_score_api::handlers::{self, AppState};
use nova_score_api::pipeline::ScoringPipeline;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The scoring model (loaded once, before the listener binds).
/// - HTTP routes and middleware (CORS, rate limiting, body limit, timeout).
///
/// A model that fails to load does not stop the server: it starts degraded
/// and answers scoring requests with 503 until restarted with a valid model.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_score_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let pipeline = match load_model(&config.model) {
        Ok(model) => ScoringPipeline::new(model),
        Err(e) => {
            tracing::error!(
                "Failed to load model from {}: {:#}. Serving without a model",
                config.model.model_path,
                e
            );
            ScoringPipeline::unloaded()
        }
    };

    let app_state = Arc::new(AppState {
        config: config.clone(),
        pipeline,
    });

    // Per-IP rate limiting on scoring routes; the builder takes a replenish interval
    let replenish_ms = (1000 / config.rate_limit_per_second).max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        // Legacy path kept for the standalone HTML form
        .route("/predict", post(handlers::predict))
        .route("/api/v1/predict", post(handlers::predict))
        .route("/api/v1/predict/batch", post(handlers::predict_batch))
        .route("/api/v1/model", get(handlers::model_info))
        .layer(
            ServiceBuilder::new()
                // Enforced by the JSON extractor so oversized bodies get a JSON 413
                .layer(DefaultBodyLimit::max(config.max_body_bytes))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
