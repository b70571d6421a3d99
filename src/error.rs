//! Error taxonomy with HTTP status code mapping.
//!
//! Three client/server concerns are kept apart, and [`GatewayError`]
//! folds them into one type that handlers return:
//!
//! | Type                | Cause                                   | HTTP |
//! |---------------------|-----------------------------------------|------|
//! | [`AuthError`]       | missing, malformed, or mismatched proof | 401  |
//! | [`ValidationError`] | missing/invalid field, self-referral    | 400  |
//! | [`StorageError`]    | persistence unavailable or corrupt      | 500  |
//!
//! Every error renders as the standard envelope:
//! ```json
//! { "success": false, "message": "Authentication failed: invalid signature", "error": "signature_mismatch" }
//! ```
//! Storage and internal errors never expose their detail to the caller; it
//! is logged instead.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::api::dto::ErrorEnvelope;

/// Wallet authentication failures. Always HTTP 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `walletAddress`, `signature`, or `message` was absent or empty.
    #[error(
        "Authentication failed: missing required parameters (walletAddress, signature, message)"
    )]
    MissingParameters,

    /// The claimed wallet is not a 20-byte hex address.
    #[error("Authentication failed: invalid wallet address {0:?}")]
    InvalidClaimedAddress(String),

    /// The signature is not a 65-byte hex string with a valid recovery id.
    #[error("Authentication failed: invalid signature format ({0})")]
    MalformedSignature(String),

    /// The recovered signer is not the claimed wallet.
    #[error("Authentication failed: invalid signature")]
    SignatureMismatch,

    /// The signed message is not a fresh challenge for the claimed wallet.
    #[error("Authentication failed: {0}")]
    InvalidChallenge(String),
}

/// Request validation failures. Always HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field is not shaped like a wallet address.
    #[error("{field} is not a valid wallet address: {value:?}")]
    InvalidAddress {
        /// Field name as it appears in the request.
        field: &'static str,
        /// Raw value received.
        value: String,
    },

    /// Referrer and referee are the same wallet.
    #[error("Cannot refer yourself")]
    SelfReferral,

    /// The body is not valid JSON for this route.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Persistence failures. Always HTTP 500 with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness conflict that could not be resolved to an existing
    /// record.
    #[error("unresolved conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Top-level error returned by handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// See [`AuthError`].
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// See [`ValidationError`].
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// See [`StorageError`].
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Client exceeded the per-IP request budget.
    #[error("Too many requests, please try again in {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds until the current window resets.
        retry_after_secs: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the stable machine-readable code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(AuthError::MissingParameters) => "missing_parameters",
            Self::Auth(AuthError::InvalidClaimedAddress(_)) => "invalid_claimed_address",
            Self::Auth(AuthError::MalformedSignature(_)) => "malformed_signature",
            Self::Auth(AuthError::SignatureMismatch) => "signature_mismatch",
            Self::Auth(AuthError::InvalidChallenge(_)) => "invalid_challenge",
            Self::Validation(ValidationError::MissingField(_)) => "missing_field",
            Self::Validation(ValidationError::InvalidAddress { .. }) => "invalid_address",
            Self::Validation(ValidationError::SelfReferral) => "self_referral",
            Self::Validation(ValidationError::MalformedBody(_)) => "malformed_body",
            Self::Storage(_) => "storage_error",
            Self::RateLimited { .. } => "rate_limited",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(err) => tracing::error!(error = %err, "storage failure"),
            Self::Internal(detail) => tracing::error!(detail = %detail, "internal failure"),
            _ => {}
        }

        let status = self.status_code();
        let body = ErrorEnvelope::new(self.public_message(), self.error_code());
        let mut response = (status, axum::Json(body)).into_response();

        if let Self::RateLimited { retry_after_secs } = self
            && let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
