use crate::telegram::TelegramError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Gateway error taxonomy. Every handler failure is converted to one of these
/// variants and mapped to the JSON error envelope exactly once, in
/// [`IntoResponse`] - no error ever reaches a bare framework error page.
#[derive(ThisError, Debug)]
pub enum Error {
    /// A password is configured and the request carried no Authorization header
    #[error("password required")]
    Unauthenticated,

    /// A password is configured and the bearer value did not match
    #[error("invalid password")]
    Forbidden,

    /// Invalid request data (empty identifier, malformed multipart, ...)
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload body larger than the configured ceiling
    #[error("file size must not exceed {limit_mib}MB")]
    PayloadTooLarge { limit_mib: u64 },

    /// The origin could not resolve the identifier
    #[error("failed to resolve file: {message}")]
    NotFound { message: String },

    /// The origin responded, but not with the bytes we asked for
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Storage client handle is not initialized and could not be rebuilt
    #[error("storage client not initialized")]
    ServiceUnavailable,

    /// Submission to Telegram failed
    #[error("Telegram error: {0}")]
    Storage(TelegramError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { status, .. } => *status,
            Error::ServiceUnavailable | Error::Storage(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details server-side - different levels based on severity
        match &self {
            Error::ServiceUnavailable | Error::Storage(_) | Error::Other(_) => {
                tracing::error!("Internal gateway error: {:#}", self);
            }
            Error::Upstream { status, .. } => {
                tracing::error!(upstream_status = %status, "Upstream error: {}", self);
            }
            Error::Unauthenticated | Error::Forbidden => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::PayloadTooLarge { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;
