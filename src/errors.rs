// src/errors.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use crate::{models::CommissionStatus, store::RepositoryError};

/// Why an automatic clawback was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClawbackReason {
    /// The employee has no clawback policy configured.
    NoPolicy,
    /// The policy forbids negative deltas outright.
    NegativeDeltasDisallowed,
    /// The original sale is older than the policy's window.
    OutsideWindow { age_days: i64, max_age_days: u32 },
}

impl std::fmt::Display for ClawbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClawbackReason::NoPolicy => write!(f, "employee has no clawback policy"),
            ClawbackReason::NegativeDeltasDisallowed => {
                write!(f, "policy does not allow negative deltas")
            }
            ClawbackReason::OutsideWindow {
                age_days,
                max_age_days,
            } => write!(
                f,
                "sale is {} days old, policy window is {} days",
                age_days, max_age_days
            ),
        }
    }
}

/// Errors produced by the commission engine itself. All of them are values handed back to
/// the caller; none of them leave a partially applied mutation behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Invalid formula for structure '{structure}': {reason}")]
    InvalidFormula { structure: String, reason: String },

    #[error("No tier matches basis value {value}")]
    NoMatchingTier { value: Decimal },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(
        "Clawback rejected for record {record_id} (delta {delta}, sold {sold_on}): {reason}; manual review required"
    )]
    ClawbackRejected {
        record_id: String,
        delta: Decimal,
        sold_on: NaiveDate,
        reason: ClawbackReason,
    },

    #[error("Record {id} is {status:?} and can no longer change")]
    RecordClosed { id: String, status: CommissionStatus },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Engine(EngineError::Repository(err))
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Engine(engine) => match engine {
                EngineError::NotFound(_) | EngineError::Repository(RepositoryError::NotFound(_)) => {
                    StatusCode::NOT_FOUND
                }
                EngineError::ClawbackRejected { .. }
                | EngineError::RecordClosed { .. }
                | EngineError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                EngineError::InvalidFormula { .. } | EngineError::NoMatchingTier { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                EngineError::Repository(RepositoryError::Unavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

// Convenience alias
pub type AppResult<T> = Result<T, AppError>;
