use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::ModelError(_) => "MODEL_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ModelError(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON serialization error: {}", err))
    }
}
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}
impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::NoTypeSelected | GenerationError::PageAccessUnavailable => {
                AppError::BadRequest(err.to_string())
            }
            GenerationError::AlreadyRunning => AppError::Conflict(err.to_string()),
            GenerationError::Storage(msg) => AppError::StorageError(msg),
            GenerationError::Model(msg) => AppError::ModelError(msg),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the JSON recovery cascade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No JSON found in response")]
    NoJsonFound,

    #[error("Failed to parse response as JSON: {0}")]
    Parse(String),
}

/// Failures of one quiz generation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Please select at least one test type")]
    NoTypeSelected,

    #[error("Page content access is not available")]
    PageAccessUnavailable,

    #[error("{0}")]
    PageContent(String),

    #[error("Model call failed: {0}")]
    Model(String),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("Invalid question format: {0}")]
    InvalidFormat(String),

    #[error("Failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("A generation is already in progress")]
    AlreadyRunning,
}

impl GenerationError {
    /// Transient failures are retried by the orchestrator; everything else ends the run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Model(_)
                | GenerationError::Extraction(_)
                | GenerationError::InvalidFormat(_)
        )
    }
}

impl From<AppError> for GenerationError {
    fn from(err: AppError) -> Self {
        GenerationError::Storage(err.to_string())
    }
}
