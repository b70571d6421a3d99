//! Referral service: logs and verifies referrer → referee links.

use chrono::Utc;

use crate::domain::{ReferralLink, ReferralStatus, WalletAddress};
use crate::error::{GatewayError, ValidationError};
use crate::persistence::{InsertOutcome, Store};

/// Records referral links and answers referral queries.
#[derive(Debug, Clone)]
pub struct ReferralService {
    store: Store,
    link_base_url: String,
}

impl ReferralService {
    /// Creates a new `ReferralService`. Referral links are rendered under
    /// `link_base_url`.
    #[must_use]
    pub fn new(store: Store, link_base_url: impl Into<String>) -> Self {
        Self {
            store,
            link_base_url: link_base_url.into(),
        }
    }

    /// Records that `referrer` onboarded `referee`, the verified caller.
    ///
    /// Rejects self-referral before touching the store. Both users are
    /// refreshed, then the link is inserted once per ordered pair; repeat
    /// calls return the stored link as [`InsertOutcome::Existing`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SelfReferral`] if both wallets are the
    /// same, or [`GatewayError::Storage`] on persistence failure.
    pub async fn log_referral(
        &self,
        referrer: &WalletAddress,
        referee: &WalletAddress,
    ) -> Result<InsertOutcome<ReferralLink>, GatewayError> {
        if referrer == referee {
            return Err(ValidationError::SelfReferral.into());
        }

        let now = Utc::now();
        self.store.touch_user(referrer, now).await?;
        self.store.touch_user(referee, now).await?;

        if let Some(existing) = self.store.find_referral(referrer, referee).await? {
            tracing::debug!(
                referral_id = %existing.id,
                %referrer,
                %referee,
                "referral already recorded"
            );
            return Ok(InsertOutcome::Existing(existing));
        }

        let link = ReferralLink::completed(referrer.clone(), referee.clone());
        let outcome = self.store.insert_referral(&link).await?;
        if let InsertOutcome::Created(stored) = &outcome {
            tracing::info!(referral_id = %stored.id, %referrer, %referee, "referral logged");
        }
        Ok(outcome)
    }

    /// Returns the `completed` referrals made by `referrer`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on persistence failure.
    pub async fn referrals_by(
        &self,
        referrer: &WalletAddress,
    ) -> Result<Vec<ReferralLink>, GatewayError> {
        Ok(self.store.completed_referrals(referrer).await?)
    }

    /// Returns the `completed` link for exactly `referrer` → `referee`, if
    /// any. The reverse direction is a different link.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on persistence failure.
    pub async fn verify_connection(
        &self,
        referrer: &WalletAddress,
        referee: &WalletAddress,
    ) -> Result<Option<ReferralLink>, GatewayError> {
        Ok(self
            .store
            .find_referral(referrer, referee)
            .await?
            .filter(|link| link.status == ReferralStatus::Completed))
    }

    /// Renders the shareable referral link for `wallet`.
    #[must_use]
    pub fn referral_link(&self, wallet: &WalletAddress) -> String {
        format!("{}/?ref={wallet}", self.link_base_url.trim_end_matches('/'))
    }
}
