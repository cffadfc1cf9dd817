//! Market Error Types
//!
//! This module provides market-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Market-specific result type alias
pub type MarketResult<T> = Result<T, MarketError>;

/// Market-specific error variants
///
/// Every business-rule rejection is a typed variant the glue layer can
/// translate into a user-facing message. Storage failures are a separate
/// class (`Database`, `StorageUnavailable`) that aborts the operation
/// without partial effect.
#[derive(Debug, Error)]
pub enum MarketError {
    /// No user with the given ID
    #[error("User not found")]
    UserNotFound,

    /// Seller does not own the referenced token
    #[error("Token not found in collection")]
    TokenNotFound,

    /// Listing does not exist (sold, cancelled, or never created)
    #[error("Listing not found")]
    ListingNotFound,

    /// Collection index out of range at transaction time
    #[error("Index out of range")]
    InvalidIndex,

    /// Buyer cannot afford the listing price
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Buyer and seller are the same user
    #[error("Cannot purchase your own listing")]
    SelfPurchase,

    /// Both sides of the exchange are the same user
    #[error("Cannot exchange with yourself")]
    SelfExchange,

    /// Login requested while already logged in
    #[error("Already logged in")]
    AlreadyLoggedIn,

    /// Login code missing or past its expiry
    #[error("Login code expired")]
    CodeExpired,

    /// Submitted code does not match the stored one
    #[error("Login code mismatch")]
    CodeMismatch,

    /// Daily mint quota exhausted
    #[error("Daily mint quota exhausted")]
    QuotaExceeded,

    /// Non-positive price
    #[error("Price must be a positive amount")]
    InvalidAmount,

    /// Request carries no user identity (glue-level)
    #[error("No user identity in request")]
    Unidentified,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document store unavailable (I/O or serialization failure)
    #[error("Store unavailable: {0}")]
    StorageUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketError::UserNotFound
            | MarketError::TokenNotFound
            | MarketError::ListingNotFound => StatusCode::NOT_FOUND,
            MarketError::InvalidIndex | MarketError::InvalidAmount => StatusCode::BAD_REQUEST,
            MarketError::InsufficientBalance => StatusCode::UNPROCESSABLE_ENTITY,
            MarketError::SelfPurchase
            | MarketError::SelfExchange
            | MarketError::AlreadyLoggedIn => StatusCode::CONFLICT,
            MarketError::CodeExpired => StatusCode::GONE,
            MarketError::CodeMismatch | MarketError::Unidentified => StatusCode::UNAUTHORIZED,
            MarketError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            MarketError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MarketError::Database(_) | MarketError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::UserNotFound
            | MarketError::TokenNotFound
            | MarketError::ListingNotFound => ErrorKind::NotFound,
            MarketError::InvalidIndex | MarketError::InvalidAmount => ErrorKind::BadRequest,
            MarketError::InsufficientBalance => ErrorKind::UnprocessableEntity,
            MarketError::SelfPurchase
            | MarketError::SelfExchange
            | MarketError::AlreadyLoggedIn => ErrorKind::Conflict,
            MarketError::CodeExpired => ErrorKind::Gone,
            MarketError::CodeMismatch | MarketError::Unidentified => ErrorKind::Unauthorized,
            MarketError::QuotaExceeded => ErrorKind::TooManyRequests,
            MarketError::StorageUnavailable(_) => ErrorKind::ServiceUnavailable,
            MarketError::Database(_) | MarketError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            MarketError::Database(e) => {
                tracing::error!(error = %e, "Market database error");
            }
            MarketError::StorageUnavailable(msg) => {
                tracing::error!(message = %msg, "Market store unavailable");
            }
            MarketError::Internal(msg) => {
                tracing::error!(message = %msg, "Market internal error");
            }
            MarketError::CodeMismatch => {
                tracing::warn!("Login code mismatch");
            }
            MarketError::InsufficientBalance => {
                tracing::warn!("Purchase attempt with insufficient balance");
            }
            _ => {
                tracing::debug!(error = %self, "Market error");
            }
        }
    }
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        err.to_app_error()
    }
}

impl From<std::io::Error> for MarketError {
    fn from(err: std::io::Error) -> Self {
        MarketError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::StorageUnavailable(err.to_string())
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
