use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use serde_json::json;
use strum_macros::{AsRefStr, Display as StrumDisplay};
use utoipa::ToSchema;

use crate::engine::geofence::Coordinates;

/// Broad classes of failure, each mapping to one HTTP status.
#[derive(Debug, Copy, Clone, Eq, PartialEq, StrumDisplay, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    PolicyViolation,
    Authorization,
    Validation,
    NotFound,
    Internal,
}

/// Details returned when a reported position falls outside the geofence.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LocationOutOfRange {
    #[schema(example = 312.4)]
    pub distance_meters: f64,
    #[schema(example = 200.0)]
    pub radius_meters: f64,
    #[schema(example = "SD Harapan Bangsa")]
    pub workplace_name: String,
    pub workplace: Coordinates,
    pub reported: Coordinates,
}

impl std::fmt::Display for LocationOutOfRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "You are {:.0} m away from {}, the allowed radius is {:.0} m",
            self.distance_meters, self.workplace_name, self.radius_meters
        )
    }
}

#[derive(Debug, Display)]
pub enum CoreError {
    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,
    #[display(fmt = "Already checked out today")]
    AlreadyCheckedOut,
    #[display(fmt = "No check-in found for today")]
    NoCheckInYet,
    #[display(fmt = "Leave request already processed: {}", _0)]
    AlreadyProcessed(String),
    #[display(fmt = "{}", _0)]
    InvalidTransition(String),
    #[display(fmt = "{}", _0)]
    LocationOutOfRange(Box<LocationOutOfRange>),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "Storage error: {}", _0)]
    Storage(String),
}

impl std::error::Error for CoreError {}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::AlreadyCheckedIn
            | CoreError::AlreadyCheckedOut
            | CoreError::NoCheckInYet
            | CoreError::AlreadyProcessed(_)
            | CoreError::InvalidTransition(_) => ErrorKind::Conflict,
            CoreError::LocationOutOfRange(_) => ErrorKind::PolicyViolation,
            CoreError::Unauthorized(_) | CoreError::Forbidden(_) => ErrorKind::Authorization,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::PolicyViolation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            CoreError::Storage(details) => {
                tracing::error!(error = %details, "Storage failure");
                json!({
                    "error": self.kind().as_ref(),
                    "message": "Internal Server Error"
                })
            }
            CoreError::LocationOutOfRange(details) => json!({
                "error": self.kind().as_ref(),
                "message": self.to_string(),
                "details": details
            }),
            _ => json!({
                "error": self.kind().as_ref(),
                "message": self.to_string()
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
