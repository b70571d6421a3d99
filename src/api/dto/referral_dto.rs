//! Referral request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::required_address;
use crate::auth::AuthClaim;
use crate::domain::{ReferralLink, WalletAddress};
use crate::error::ValidationError;

/// Body of `POST /api/referral/log` and `POST /api/referral/verify`.
///
/// The referee is always the verified caller, never a body field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerRequest {
    /// Wallet that made the referral.
    #[serde(default)]
    #[schema(example = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf")]
    pub referrer_address: Option<String>,
    /// Credential fields, listed here so the OpenAPI schema documents them.
    /// The signature gate reads them from the raw body; handlers do not.
    #[serde(flatten)]
    pub auth: AuthClaim,
}

impl ReferrerRequest {
    /// Validated `referrerAddress`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the field is missing or malformed.
    pub fn referrer_address(&self) -> Result<WalletAddress, ValidationError> {
        required_address("referrerAddress", self.referrer_address.as_deref())
    }
}

/// One referred wallet in a [`ReferralCountResponse`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferredWallet {
    /// Wallet that was referred.
    pub referee: WalletAddress,
    /// When the referral was logged.
    pub timestamp: DateTime<Utc>,
}

impl From<ReferralLink> for ReferredWallet {
    fn from(link: ReferralLink) -> Self {
        Self {
            referee: link.referee,
            timestamp: link.timestamp,
        }
    }
}

/// Payload of `GET /api/referral/count/{walletAddress}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCountResponse {
    /// Number of completed referrals.
    pub count: u64,
    /// The referred wallets, oldest first.
    pub referrals: Vec<ReferredWallet>,
}

impl From<Vec<ReferralLink>> for ReferralCountResponse {
    fn from(links: Vec<ReferralLink>) -> Self {
        Self {
            count: links.len() as u64,
            referrals: links.into_iter().map(ReferredWallet::from).collect(),
        }
    }
}

/// Payload of `POST /api/referral/verify`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReferralResponse {
    /// Whether the referrer → caller link exists and is completed.
    pub is_referred: bool,
    /// The matching link, or `null`.
    pub referral: Option<ReferralLink>,
}

impl From<Option<ReferralLink>> for VerifyReferralResponse {
    fn from(referral: Option<ReferralLink>) -> Self {
        Self {
            is_referred: referral.is_some(),
            referral,
        }
    }
}

/// Payload of `GET /api/referral/link/{walletAddress}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralLinkResponse {
    /// Shareable URL carrying the wallet as `ref`.
    pub referral_link: String,
}
