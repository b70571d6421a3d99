//! Row types for the PostgreSQL tables and their mapping to domain values.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::{
    ReferralId, ReferralLink, TrackingEvent, TrackingId, TrackingMetadata, TrackingStats, User,
    WalletAddress,
};
use crate::error::StorageError;

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Primary key.
    pub wallet_address: String,
    /// Last interaction time.
    pub last_seen: DateTime<Utc>,
}

/// A row from the `tracking_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackingEventRow {
    /// Record id.
    pub id: Uuid,
    /// Actor wallet.
    pub wallet_address: String,
    /// Subject wallet.
    pub tracked_address: String,
    /// `input` or `track`.
    pub event_type: String,
    /// JSONB metadata.
    pub metadata: Json<TrackingMetadata>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A row from the `referral_links` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReferralLinkRow {
    /// Record id.
    pub id: Uuid,
    /// Inviting wallet.
    pub referrer: String,
    /// Invited wallet.
    pub referee: String,
    /// `pending` or `completed`.
    pub status: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Aggregate row produced by the tracking stats query.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct TrackingStatsRow {
    /// `COUNT(*) FILTER (WHERE event_type = 'input')`.
    pub input_count: i64,
    /// `COUNT(*) FILTER (WHERE event_type = 'track')`.
    pub track_count: i64,
    /// `COUNT(DISTINCT tracked_address)`.
    pub unique_wallets_tracked: i64,
}

fn address(column: &str, raw: &str) -> Result<WalletAddress, StorageError> {
    WalletAddress::parse(raw).map_err(|e| StorageError::Corrupt(format!("{column}: {e}")))
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            wallet_address: address("users.wallet_address", &row.wallet_address)?,
            last_seen: row.last_seen,
        })
    }
}

impl TryFrom<TrackingEventRow> for TrackingEvent {
    type Error = StorageError;

    fn try_from(row: TrackingEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TrackingId::from_uuid(row.id),
            wallet_address: address("tracking_events.wallet_address", &row.wallet_address)?,
            tracked_address: address("tracking_events.tracked_address", &row.tracked_address)?,
            event_type: row.event_type.parse().map_err(StorageError::Corrupt)?,
            metadata: row.metadata.0,
            timestamp: row.created_at,
        })
    }
}

impl TryFrom<ReferralLinkRow> for ReferralLink {
    type Error = StorageError;

    fn try_from(row: ReferralLinkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReferralId::from_uuid(row.id),
            referrer: address("referral_links.referrer", &row.referrer)?,
            referee: address("referral_links.referee", &row.referee)?,
            status: row.status.parse().map_err(StorageError::Corrupt)?,
            timestamp: row.created_at,
        })
    }
}

impl From<TrackingStatsRow> for TrackingStats {
    fn from(row: TrackingStatsRow) -> Self {
        Self {
            input_count: u64::try_from(row.input_count).unwrap_or(0),
            track_count: u64::try_from(row.track_count).unwrap_or(0),
            unique_wallets_tracked: u64::try_from(row.unique_wallets_tracked).unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackingEventType;

    const WALLET: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn tracking_row_maps_to_domain() {
        let row = TrackingEventRow {
            id: Uuid::new_v4(),
            wallet_address: WALLET.to_string(),
            tracked_address: WALLET.to_string(),
            event_type: "track".to_string(),
            metadata: Json(TrackingMetadata::default()),
            created_at: Utc::now(),
        };
        let event = TrackingEvent::try_from(row).ok();
        assert_eq!(event.map(|e| e.event_type), Some(TrackingEventType::Track));
    }

    #[test]
    fn corrupt_rows_are_rejected() {
        let row = ReferralLinkRow {
            id: Uuid::new_v4(),
            referrer: "not-an-address".to_string(),
            referee: WALLET.to_string(),
            status: "completed".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(ReferralLink::try_from(row), Err(StorageError::Corrupt(_))));

        let row = ReferralLinkRow {
            id: Uuid::new_v4(),
            referrer: WALLET.to_string(),
            referee: WALLET.to_string(),
            status: "archived".to_string(),
            created_at: Utc::now(),
        };
        assert!(ReferralLink::try_from(row).is_err());
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let stats = TrackingStats::from(TrackingStatsRow {
            input_count: -1,
            track_count: 3,
            unique_wallets_tracked: 2,
        });
        assert_eq!(stats.input_count, 0);
        assert_eq!(stats.track_count, 3);
    }
}
