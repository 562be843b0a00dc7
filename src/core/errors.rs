use spin_sdk::http::Response;
use std::fmt;
use thiserror::Error;

/// The remote calls that make up a follow/unfollow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowStep {
    ReadTarget,
    UpdateCurrentUser,
    UpdateTarget,
}

impl fmt::Display for FollowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowStep::ReadTarget => write!(f, "read target user"),
            FollowStep::UpdateCurrentUser => write!(f, "update current user"),
            FollowStep::UpdateTarget => write!(f, "update target user"),
        }
    }
}

/// Domain failures raised by the store, auth and follow layers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("must be logged in to follow users")]
    NotAuthenticated,

    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    /// Earlier steps of the sequence may already have been applied.
    #[error("follow failed at step `{step}`: {source}")]
    FollowFailed {
        step: FollowStep,
        #[source]
        source: Box<AppError>,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Conflict(String),
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl ApiError {
    fn status(&self) -> http::StatusCode {
        match self {
            ApiError::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => http::StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => http::StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => http::StatusCode::CONFLICT,
            ApiError::InternalError(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalError(msg) => msg,
            ApiError::Unauthorized => "Unauthorized",
        }
    }
}

impl From<ApiError> for Response {
    fn from(err: ApiError) -> Self {
        let body = serde_json::to_vec(&serde_json::json!({ "error": err.message() }))
            .unwrap_or_default();
        Response::builder()
            .status(err.status().as_u16())
            .header("Content-Type", "application/json")
            .body(body)
            .build()
    }
}

impl std::error::Error for ApiError {}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotAuthenticated | AppError::InvalidCredentials => ApiError::Unauthorized,
            AppError::NotFound(..) => ApiError::NotFound(err.to_string()),
            AppError::Validation(msg) => ApiError::BadRequest(msg),
            AppError::Conflict(msg) => ApiError::Conflict(msg),
            AppError::FollowFailed { ref source, .. } if matches!(**source, AppError::NotFound(..)) => {
                ApiError::NotFound(source.to_string())
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

// Anything that escapes the domain layer untyped is an internal error.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
