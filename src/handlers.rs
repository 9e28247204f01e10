use crate::artifact::ModelMetadata;
use crate::config::Config;
use crate::errors::{AppError, ResultExt, ScoringError};
use crate::models::*;
use crate::pipeline::ScoringPipeline;
use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Scoring pipeline; holds the model loaded at startup, if any.
    pub pipeline: ScoringPipeline,
}

/// JSON body extractor whose rejections use the `{error, code}` payload.
///
/// A field with the wrong type or a missing mandatory field becomes
/// `INVALID_FEATURE_VALUE`; unparseable bodies become `BAD_REQUEST`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Health check endpoint.
///
/// Always answers 200 so the process stays up for inspection; `status`
/// reads `degraded` while no model is loaded. Also reports the request
/// limits in force.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let model_loaded = state.pipeline.is_ready();
    (
        StatusCode::OK,
        Json(json!({
            "status": if model_loaded { "healthy" } else { "degraded" },
            "service": "nova-score-api",
            "version": env!("CARGO_PKG_VERSION"),
            "model_loaded": model_loaded,
            "limits": {
                "rate_limit_per_second": state.config.rate_limit_per_second,
                "rate_limit_burst": state.config.rate_limit_burst,
                "max_body_bytes": state.config.max_body_bytes,
                "request_timeout_secs": state.config.request_timeout_secs,
            },
        })),
    )
}

/// POST /api/v1/predict
///
/// Scores a single partner profile. Only the five core attributes are
/// required; behavioral attributes fall back to population defaults.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `profile` - JSON body with the partner attributes.
///
/// # Returns
///
/// * `Result<Json<ScoreResponse>, AppError>` - The Nova Score or an error.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    AppJson(profile): AppJson<PartnerProfile>,
) -> Result<Json<ScoreResponse>, AppError> {
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, district = %profile.city_district, "POST /predict");

    let result = state.pipeline.score(&profile)?;

    tracing::info!(
        %request_id,
        nova_score = result.nova_score,
        "Nova Score computed: {} ({})",
        result.nova_score,
        result.repayment_percentage()
    );

    Ok(Json(ScoreResponse::from(result)))
}

/// POST /api/v1/predict/batch
///
/// Scores several profiles in one call. Either every profile is scored or the
/// request fails as a whole, naming the first offending profile.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - JSON body with a `profiles` array.
///
/// # Returns
///
/// * `Result<Json<BatchScoreResponse>, AppError>` - Scores in request order or an error.
pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<BatchScoreRequest>,
) -> Result<Json<BatchScoreResponse>, AppError> {
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, profiles = request.profiles.len(), "POST /predict/batch");

    if request.profiles.is_empty() {
        return Err(AppError::BadRequest(
            "At least one profile is required".to_string(),
        ));
    }

    let results = match state.pipeline.score_batch(&request.profiles) {
        Ok(results) => results,
        Err((index, err)) => return Err(err).with_context(|| format!("profiles[{}]", index)),
    };

    tracing::info!(%request_id, scored = results.len(), "Batch scored");

    Ok(Json(BatchScoreResponse {
        results: results.into_iter().map(ScoreResponse::from).collect(),
    }))
}

/// GET /api/v1/model
///
/// Describes the loaded model: fingerprint, feature order and class mapping.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `Result<Json<ModelMetadata>, AppError>` - Model metadata, or 503 when no model is loaded.
pub async fn model_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelMetadata>, AppError> {
    let metadata = state
        .pipeline
        .metadata()
        .ok_or(AppError::Scoring(ScoringError::ModelUnavailable))?;

    Ok(Json(metadata.clone()))
}
