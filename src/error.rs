use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::config::Environment;
use crate::state::SharedState;

/// Underlying cause of a 5xx, attached to the response as an extension so
/// the body stays generic while the detail survives past `into_response`.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// Closed set of failures a handler can surface. Every route returns
/// `Result<_, ApiError>` and the mapping to an HTTP status lives here,
/// nowhere else.
#[derive(Debug)]
pub enum ApiError {
    /// Field-level validation failures, one message per offending field.
    Validation(Vec<String>),
    DuplicateEmail,
    DuplicateContact,
    /// Deliberately identical for unknown email and wrong password.
    InvalidCredentials,
    MissingToken,
    InvalidToken,
    TokenExpired,
    /// Valid token whose subject no longer exists in the store.
    UserNotFound,
    AccountDisabled,
    /// Resource name, e.g. "Contact". Non-owned rows also surface as 404.
    NotFound(&'static str),
    /// Bulk delete matched fewer owned rows than requested.
    PartialOwnership,
    Forbidden(String),
    RateLimited,
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Validation(errors) => write!(f, "Invalid data: {}", errors.join(", ")),
            ApiError::DuplicateEmail => write!(f, "A user with this email already exists"),
            ApiError::DuplicateContact => write!(f, "A contact with this email already exists"),
            ApiError::InvalidCredentials => write!(f, "Incorrect email or password"),
            ApiError::MissingToken => write!(f, "Access token required"),
            ApiError::InvalidToken => write!(f, "Invalid token"),
            ApiError::TokenExpired => write!(f, "Token expired"),
            ApiError::UserNotFound => write!(f, "User not found"),
            ApiError::AccountDisabled => write!(f, "Account disabled"),
            ApiError::NotFound(resource) => write!(f, "{resource} not found"),
            ApiError::PartialOwnership => {
                write!(f, "Some contacts do not exist or do not belong to you")
            }
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            ApiError::RateLimited => write!(f, "Too many attempts, please try again later"),
            ApiError::Internal(msg) => write!(f, "Internal error: {msg}"),
            ApiError::Database(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::DuplicateContact
            | ApiError::PartialOwnership => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::MissingToken
            | ApiError::InvalidToken
            | ApiError::TokenExpired
            | ApiError::UserNotFound
            | ApiError::AccountDisabled => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut detail = None;
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "message": "Invalid data",
                "errors": errors,
            }),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                detail = Some(msg.clone());
                json!({ "success": false, "message": "Internal server error" })
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {err}");
                detail = Some(err.to_string());
                json!({ "success": false, "message": "Internal server error" })
            }
            other => json!({ "success": false, "message": other.to_string() }),
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response
    }
}

/// Outside production, rewrite 5xx bodies to include the underlying cause.
/// Production responses pass through untouched and keep the generic message.
pub async fn expose_error_detail(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    if state.config.environment == Environment::Production {
        return response;
    }
    if let Some(detail) = response.extensions_mut().remove::<ErrorDetail>() {
        let status = response.status();
        return (
            status,
            axum::Json(json!({
                "success": false,
                "message": "Internal server error",
                "error": detail.0,
            })),
        )
            .into_response();
    }
    response
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err)
    }
}
