//! Response envelopes shared by every `/api` endpoint, and boundary
//! parsing helpers for address fields.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::WalletAddress;
use crate::error::ValidationError;

/// Standard response envelope.
///
/// ```json
/// { "success": true, "message": "Referral logged successfully", "data": { ... } }
/// ```
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiEnvelope<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Route-specific payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Successful response carrying `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Successful response carrying `data` and a message.
    #[must_use]
    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// Error body rendered for every failed request.
///
/// ```json
/// { "success": false, "message": "Cannot refer yourself", "error": "self_referral" }
/// ```
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason.
    pub message: String,
    /// Stable machine-readable code.
    pub error: String,
}

impl ErrorEnvelope {
    /// Builds a failure body.
    #[must_use]
    pub fn new(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: error.into(),
        }
    }
}

/// Parses a required address-bearing body field.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] when `value` is absent or
/// blank, and [`ValidationError::InvalidAddress`] when it is not a wallet
/// address.
pub fn required_address(
    field: &'static str,
    value: Option<&str>,
) -> Result<WalletAddress, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => path_address(field, raw),
        None => Err(ValidationError::MissingField(field)),
    }
}

/// Parses an address taken from a path segment.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAddress`] when `raw` is not a wallet
/// address.
pub fn path_address(field: &'static str, raw: &str) -> Result<WalletAddress, ValidationError> {
    WalletAddress::parse(raw).map_err(|_| ValidationError::InvalidAddress {
        field,
        value: raw.to_string(),
    })
}
