//! Referral links between an inviter and the wallet it onboarded.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ReferralId, WalletAddress};

/// Referral lifecycle state. This service only ever writes `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    /// Recorded but not confirmed.
    Pending,
    /// Confirmed connection.
    Completed,
}

impl ReferralStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown referral status: {other}")),
        }
    }
}

/// A stored referral link. Unique per ordered `(referrer, referee)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralLink {
    /// Record id.
    pub id: ReferralId,
    /// Inviting wallet.
    pub referrer: WalletAddress,
    /// Invited wallet; the verified caller at creation time.
    pub referee: WalletAddress,
    /// Lifecycle state.
    pub status: ReferralStatus,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
}

impl ReferralLink {
    /// Builds a new `completed` link stamped with a fresh id and the
    /// current time. The caller is responsible for rejecting self-referrals.
    #[must_use]
    pub fn completed(referrer: WalletAddress, referee: WalletAddress) -> Self {
        Self {
            id: ReferralId::new(),
            referrer,
            referee,
            status: ReferralStatus::Completed,
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` if this link connects exactly `referrer` → `referee`.
    #[must_use]
    pub fn connects(&self, referrer: &WalletAddress, referee: &WalletAddress) -> bool {
        &self.referrer == referrer && &self.referee == referee
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> WalletAddress {
        WalletAddress::from_bytes([byte; 20])
    }

    #[test]
    fn completed_sets_status() {
        let link = ReferralLink::completed(addr(1), addr(2));
        assert_eq!(link.status, ReferralStatus::Completed);
    }

    #[test]
    fn connects_is_ordered() {
        let link = ReferralLink::completed(addr(1), addr(2));
        assert!(link.connects(&addr(1), &addr(2)));
        assert!(!link.connects(&addr(2), &addr(1)));
    }

    #[test]
    fn status_string_round_trip() {
        for status in [ReferralStatus::Pending, ReferralStatus::Completed] {
            assert_eq!(status.as_str().parse::<ReferralStatus>(), Ok(status));
        }
    }
}
