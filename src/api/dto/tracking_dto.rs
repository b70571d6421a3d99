//! Tracking request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::required_address;
use crate::auth::AuthClaim;
use crate::domain::{TrackingId, TrackingMetadata, WalletAddress};
use crate::error::ValidationError;

/// Body of `POST /api/tracking/input` and `POST /api/tracking/click`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    /// Wallet being looked at.
    #[serde(default)]
    #[schema(example = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf")]
    pub tracked_address: Option<String>,
    /// Optional client context.
    #[serde(default)]
    pub metadata: Option<TrackingMetadata>,
    /// Credential fields, listed here so the OpenAPI schema documents them.
    /// The signature gate reads them from the raw body; handlers do not.
    #[serde(flatten)]
    pub auth: AuthClaim,
}

impl TrackRequest {
    /// Validated `trackedAddress`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the field is missing or malformed.
    pub fn tracked_address(&self) -> Result<WalletAddress, ValidationError> {
        required_address("trackedAddress", self.tracked_address.as_deref())
    }
}

/// Payload returned after recording a tracking event.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingAck {
    /// Id of the created or existing event.
    pub tracking_id: TrackingId,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_body_with_credentials() {
        let body = serde_json::json!({
            "trackedAddress": "0x7E5F4552091A69125D5DFCB7B8C2659029395BDF",
            "metadata": { "chainId": "0x1" },
            "walletAddress": "0x0000000000000000000000000000000000000001",
            "signature": "0xdead",
            "message": "hello",
        });
        let Ok(parsed) = serde_json::from_value::<TrackRequest>(body) else {
            panic!("body should parse");
        };
        assert_eq!(
            parsed.tracked_address().map(|a| a.to_string()).ok().as_deref(),
            Some("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf")
        );
        assert_eq!(
            parsed.metadata.and_then(|m| m.chain_id).as_deref(),
            Some("0x1")
        );
        assert_eq!(parsed.auth.message.as_deref(), Some("hello"));
    }

    #[test]
    fn missing_tracked_address_is_named() {
        let parsed: Option<TrackRequest> = serde_json::from_value(serde_json::json!({})).ok();
        assert_eq!(
            parsed.map(|p| p.tracked_address()),
            Some(Err(ValidationError::MissingField("trackedAddress")))
        );
    }
}
