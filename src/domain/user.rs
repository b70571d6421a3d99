//! Lazily maintained wallet records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::WalletAddress;

/// A wallet the service has seen. Upserted as a side effect of tracking and
/// referral calls; never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Wallet identity (primary key).
    pub wallet_address: WalletAddress,
    /// Last time the wallet took part in a recorded interaction.
    pub last_seen: DateTime<Utc>,
}
