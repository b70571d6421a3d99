//! PostgreSQL implementation of the persistence layer.
//!
//! Uniqueness of `track` events and referral pairs is enforced by the
//! schema (see `migrations/`). Idempotent inserts use
//! `ON CONFLICT DO NOTHING RETURNING …`; an empty result means another
//! writer won, and the winning row is fetched and returned instead.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::InsertOutcome;
use super::models::{ReferralLinkRow, TrackingEventRow, TrackingStatsRow, UserRow};
use crate::domain::{ReferralLink, TrackingEvent, TrackingStats, User, WalletAddress};
use crate::error::StorageError;

const TRACKING_COLUMNS: &str =
    "id, wallet_address, tracked_address, event_type, metadata, created_at";
const REFERRAL_COLUMNS: &str = "id, referrer, referee, status, created_at";

/// Connection settings for [`PostgresStore::connect`].
#[derive(Debug, Clone)]
pub struct PostgresSettings {
    /// Connection string.
    pub database_url: String,
    /// Pool ceiling.
    pub max_connections: u32,
    /// Idle connections kept open.
    pub min_connections: u32,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(settings: &PostgresSettings) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");

        Ok(Self::new(pool))
    }

    /// Creates the user or refreshes its `last_seen`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure.
    pub async fn touch_user(
        &self,
        wallet: &WalletAddress,
        at: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (wallet_address, last_seen) VALUES ($1, $2) \
             ON CONFLICT (wallet_address) \
             DO UPDATE SET last_seen = GREATEST(users.last_seen, EXCLUDED.last_seen) \
             RETURNING wallet_address, last_seen",
        )
        .bind(wallet.as_str())
        .bind(at)
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    /// Looks up a user.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure.
    pub async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>, StorageError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT wallet_address, last_seen FROM users WHERE wallet_address = $1",
        )
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Appends a tracking event unconditionally.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure, including a unique
    /// violation if `event` is a duplicate `track` event.
    pub async fn insert_tracking_event(
        &self,
        event: &TrackingEvent,
    ) -> Result<TrackingEvent, StorageError> {
        let row = sqlx::query_as::<_, TrackingEventRow>(&format!(
            "INSERT INTO tracking_events ({TRACKING_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {TRACKING_COLUMNS}"
        ))
        .bind(event.id.as_uuid())
        .bind(event.wallet_address.as_str())
        .bind(event.tracked_address.as_str())
        .bind(event.event_type.as_str())
        .bind(Json(&event.metadata))
        .bind(event.timestamp)
        .fetch_one(&self.pool)
        .await?;

        TrackingEvent::try_from(row)
    }

    /// Inserts a `track` event unless one already exists for the pair.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure, or
    /// [`StorageError::Conflict`] if the conflicting row vanished before it
    /// could be read.
    pub async fn insert_track_event(
        &self,
        event: &TrackingEvent,
    ) -> Result<InsertOutcome<TrackingEvent>, StorageError> {
        let inserted = sqlx::query_as::<_, TrackingEventRow>(&format!(
            "INSERT INTO tracking_events ({TRACKING_COLUMNS}) VALUES ($1, $2, $3, 'track', $4, $5) \
             ON CONFLICT (wallet_address, tracked_address) WHERE event_type = 'track' DO NOTHING \
             RETURNING {TRACKING_COLUMNS}"
        ))
        .bind(event.id.as_uuid())
        .bind(event.wallet_address.as_str())
        .bind(event.tracked_address.as_str())
        .bind(Json(&event.metadata))
        .bind(event.timestamp)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(InsertOutcome::Created(TrackingEvent::try_from(row)?));
        }

        self.find_track_event(&event.wallet_address, &event.tracked_address)
            .await?
            .map(InsertOutcome::Existing)
            .ok_or_else(|| {
                StorageError::Conflict(format!(
                    "track event {} -> {} conflicted but was not found",
                    event.wallet_address, event.tracked_address
                ))
            })
    }

    /// Finds the `track` event for an (actor, subject) pair.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure.
    pub async fn find_track_event(
        &self,
        actor: &WalletAddress,
        subject: &WalletAddress,
    ) -> Result<Option<TrackingEvent>, StorageError> {
        sqlx::query_as::<_, TrackingEventRow>(&format!(
            "SELECT {TRACKING_COLUMNS} FROM tracking_events \
             WHERE wallet_address = $1 AND tracked_address = $2 AND event_type = 'track'"
        ))
        .bind(actor.as_str())
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(TrackingEvent::try_from)
        .transpose()
    }

    /// Aggregates tracking counts for an actor wallet.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure.
    pub async fn tracking_stats(
        &self,
        actor: &WalletAddress,
    ) -> Result<TrackingStats, StorageError> {
        let row = sqlx::query_as::<_, TrackingStatsRow>(
            "SELECT \
                COUNT(*) FILTER (WHERE event_type = 'input') AS input_count, \
                COUNT(*) FILTER (WHERE event_type = 'track') AS track_count, \
                COUNT(DISTINCT tracked_address) AS unique_wallets_tracked \
             FROM tracking_events WHERE wallet_address = $1",
        )
        .bind(actor.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(TrackingStats::from(row))
    }

    /// Inserts a referral link unless the ordered pair already exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure (including the
    /// self-referral check constraint), or [`StorageError::Conflict`] if the
    /// conflicting row vanished before it could be read.
    pub async fn insert_referral(
        &self,
        link: &ReferralLink,
    ) -> Result<InsertOutcome<ReferralLink>, StorageError> {
        let inserted = sqlx::query_as::<_, ReferralLinkRow>(&format!(
            "INSERT INTO referral_links ({REFERRAL_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (referrer, referee) DO NOTHING \
             RETURNING {REFERRAL_COLUMNS}"
        ))
        .bind(link.id.as_uuid())
        .bind(link.referrer.as_str())
        .bind(link.referee.as_str())
        .bind(link.status.as_str())
        .bind(link.timestamp)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(InsertOutcome::Created(ReferralLink::try_from(row)?));
        }

        self.find_referral(&link.referrer, &link.referee)
            .await?
            .map(InsertOutcome::Existing)
            .ok_or_else(|| {
                StorageError::Conflict(format!(
                    "referral {} -> {} conflicted but was not found",
                    link.referrer, link.referee
                ))
            })
    }

    /// Finds the referral link for an ordered pair, in any status.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure.
    pub async fn find_referral(
        &self,
        referrer: &WalletAddress,
        referee: &WalletAddress,
    ) -> Result<Option<ReferralLink>, StorageError> {
        sqlx::query_as::<_, ReferralLinkRow>(&format!(
            "SELECT {REFERRAL_COLUMNS} FROM referral_links WHERE referrer = $1 AND referee = $2"
        ))
        .bind(referrer.as_str())
        .bind(referee.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(ReferralLink::try_from)
        .transpose()
    }

    /// Lists `completed` referrals made by `referrer`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on database failure.
    pub async fn completed_referrals(
        &self,
        referrer: &WalletAddress,
    ) -> Result<Vec<ReferralLink>, StorageError> {
        sqlx::query_as::<_, ReferralLinkRow>(&format!(
            "SELECT {REFERRAL_COLUMNS} FROM referral_links \
             WHERE referrer = $1 AND status = 'completed' ORDER BY created_at ASC, id ASC"
        ))
        .bind(referrer.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ReferralLink::try_from)
        .collect()
    }
}
