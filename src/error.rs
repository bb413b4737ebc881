use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::models::FieldError;

/// ConfigError
///
/// Startup failures raised by `AppConfig::load`. These are fatal: `main` logs
/// them and exits instead of serving with an unsafe configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable required for the current environment is absent.
    #[error("{0} must be set in production")]
    MissingSecret(&'static str),

    /// The production secret is the well-known local fallback.
    #[error("{0} is set to the built-in development default")]
    WeakSecret(&'static str),

    /// A variable is present but cannot be interpreted.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// TokenError
///
/// Signing or verification failure for a session token. The gate swallows
/// these and treats the request as anonymous; only the login endpoint can
/// surface one (as a 500) when signing fails.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Sign(jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Verify(jsonwebtoken::errors::Error),
}

/// ApiError
///
/// Errors returned by the `/api/auth/*` handlers. Each variant maps to a
/// single status code; the body is always a small JSON object.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Token(e) => {
                tracing::error!(error = %e, "Failed to issue session token");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let fields = match &self {
            ApiError::Validation(fields) => Some(fields.as_slice()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.to_string(),
            fields,
        };

        (status, Json(body)).into_response()
    }
}
