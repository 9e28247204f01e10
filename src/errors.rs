use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Failures raised by the scoring pipeline itself.
///
/// Every variant except `ModelUnavailable` and `MalformedModelOutput` is a
/// client-input problem: the profile is malformed or impossible and the
/// request must be rejected rather than retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// No model was loaded at process start.
    ModelUnavailable,
    /// `avg_weekly_trips` was zero, so `earnings_per_trip` is undefined.
    DivisionByZero,
    /// A column carried a value the model cannot consume (non-numeric or non-finite).
    InvalidFeatureValue {
        /// Column that held the offending value.
        column: String,
        /// Human readable description of the problem.
        reason: String,
    },
    /// A categorical field held a value outside its declared domain.
    UnknownCategory {
        /// Name of the categorical field.
        field: String,
        /// The value that was rejected.
        value: String,
    },
    /// The classifier returned probabilities that cannot be mapped to a score.
    MalformedModelOutput(String),
}

impl fmt::Display for ScoringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringError::ModelUnavailable => write!(f, "Model not loaded on the server"),
            ScoringError::DivisionByZero => {
                write!(f, "avg_weekly_trips must be at least 1 to derive earnings_per_trip")
            }
            ScoringError::InvalidFeatureValue { column, reason } => {
                write!(f, "Invalid value for feature '{}': {}", column, reason)
            }
            ScoringError::UnknownCategory { field, value } => {
                write!(f, "Unknown category '{}' for field '{}'", value, field)
            }
            ScoringError::MalformedModelOutput(msg) => write!(f, "Malformed model output: {}", msg),
        }
    }
}

impl std::error::Error for ScoringError {}

impl ScoringError {
    /// Stable machine-readable code reported in error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ScoringError::ModelUnavailable => "MODEL_UNAVAILABLE",
            ScoringError::DivisionByZero => "DIVISION_BY_ZERO",
            ScoringError::InvalidFeatureValue { .. } => "INVALID_FEATURE_VALUE",
            ScoringError::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            ScoringError::MalformedModelOutput(_) => "MODEL_OUTPUT_ERROR",
        }
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The scoring pipeline rejected the request.
    Scoring(ScoringError),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Request body exceeded the configured limit.
    PayloadTooLarge(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Scoring(e) => write!(f, "{}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status and error code for this error, following the context chain.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Scoring(e) => {
                let status = match e {
                    ScoringError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                    ScoringError::MalformedModelOutput(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    ScoringError::DivisionByZero
                    | ScoringError::InvalidFeatureValue { .. }
                    | ScoringError::UnknownCategory { .. } => StatusCode::BAD_REQUEST,
                };
                (status, e.code())
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::WithContext { source, .. } => source.status_and_code(),
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Logs errors appropriately based on their severity.
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let error_message = match &self {
            AppError::Scoring(ScoringError::ModelUnavailable) => {
                tracing::error!("Scoring requested but no model is loaded");
                self.to_string()
            }
            AppError::Scoring(ScoringError::MalformedModelOutput(msg)) => {
                tracing::error!("Model output error: {}", msg);
                "Model produced an unusable prediction".to_string()
            }
            AppError::Scoring(e) => {
                tracing::warn!("Rejected partner profile: {}", e);
                e.to_string()
            }
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::WithContext { source, context } => {
                // Server-side failures keep their generic wording
                if status.is_server_error() {
                    tracing::error!("Error with context: {} -> {}", context, source);
                    return source.clone().into_response();
                }
                tracing::warn!("Error with context: {} -> {}", context, source);
                self.to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<ScoringError> for AppError {
    /// Converts a `ScoringError` into an `AppError`.
    fn from(err: ScoringError) -> Self {
        AppError::Scoring(err)
    }
}

impl From<JsonRejection> for AppError {
    /// Classifies a body the `Json` extractor could not turn into a request.
    ///
    /// Well-formed JSON whose fields have the wrong type, an impossible value
    /// or are missing is a feature problem; anything else is a bad request.
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => AppError::Scoring(invalid_field(&err.body_text())),
            JsonRejection::BytesRejection(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge(err.body_text())
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Builds `InvalidFeatureValue` from a deserialization message such as
/// `avg_customer_rating: invalid type: string "abc", expected f64 at line 1 column 40`
/// or ``missing field `tenure_months` at line 1 column 80``.
fn invalid_field(body_text: &str) -> ScoringError {
    let detail = body_text
        .split_once("target type: ")
        .map_or(body_text, |(_, rest)| rest);

    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => (Some(path), message),
        _ => (None, detail),
    };
    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());

    let column = match (path, missing) {
        (Some(path), Some(field)) => format!("{}.{}", path, field),
        (Some(path), None) => path.to_string(),
        (None, Some(field)) => field.to_string(),
        (None, None) => "body".to_string(),
    };

    ScoringError::InvalidFeatureValue {
        column,
        reason: message.to_string(),
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for pipeline errors to add context
impl<T> ResultExt<T> for Result<T, ScoringError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Scoring(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Scoring(e)),
            context: f(),
        })
    }
}
