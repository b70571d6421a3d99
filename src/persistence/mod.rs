//! Persistence layer: users, tracking events, and referral links.
//!
//! [`Store`] is the single handle the services talk to. It is built once at
//! startup and cloned into each service; there is no global connection.
//! Two backends implement the same contract:
//!
//! - [`PostgresStore`]: durable, uniqueness enforced by indexes.
//! - [`MemoryStore`]: volatile, uniqueness enforced under one write lock.

pub mod memory;
pub mod models;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use postgres::{PostgresSettings, PostgresStore};

use crate::domain::{ReferralLink, TrackingEvent, TrackingStats, User, WalletAddress};
use crate::error::StorageError;

/// Result of an idempotent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// The record was written by this call.
    Created(T),
    /// A record with the same key already existed; it is returned unchanged.
    Existing(T),
}

impl<T> InsertOutcome<T> {
    /// Returns `true` if this call wrote the record.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Returns the record regardless of outcome.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Existing(value) => value,
        }
    }
}

/// Persistence handle shared by the services.
#[derive(Debug, Clone)]
pub enum Store {
    /// PostgreSQL backend.
    Postgres(PostgresStore),
    /// In-memory backend.
    Memory(Arc<MemoryStore>),
}

impl Store {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::new()))
    }

    /// Connects to PostgreSQL and applies migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the connection or a migration fails.
    pub async fn postgres(settings: &PostgresSettings) -> Result<Self, StorageError> {
        Ok(Self::Postgres(PostgresStore::connect(settings).await?))
    }

    /// Short backend name for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Creates the user or refreshes its `last_seen`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn touch_user(
        &self,
        wallet: &WalletAddress,
        at: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        match self {
            Self::Postgres(pg) => pg.touch_user(wallet, at).await,
            Self::Memory(mem) => Ok(mem.touch_user(wallet, at).await),
        }
    }

    /// Looks up a user.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn find_user(&self, wallet: &WalletAddress) -> Result<Option<User>, StorageError> {
        match self {
            Self::Postgres(pg) => pg.find_user(wallet).await,
            Self::Memory(mem) => Ok(mem.find_user(wallet).await),
        }
    }

    /// Appends a tracking event with no deduplication.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure or if `event` violates
    /// the `track` uniqueness rule.
    pub async fn insert_tracking_event(
        &self,
        event: &TrackingEvent,
    ) -> Result<TrackingEvent, StorageError> {
        match self {
            Self::Postgres(pg) => pg.insert_tracking_event(event).await,
            Self::Memory(mem) => mem.insert_tracking_event(event).await,
        }
    }

    /// Inserts a `track` event, or returns the one already stored for the
    /// same (actor, subject) pair.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn insert_track_event(
        &self,
        event: &TrackingEvent,
    ) -> Result<InsertOutcome<TrackingEvent>, StorageError> {
        match self {
            Self::Postgres(pg) => pg.insert_track_event(event).await,
            Self::Memory(mem) => Ok(mem.insert_track_event(event).await),
        }
    }

    /// Finds the `track` event for an (actor, subject) pair.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn find_track_event(
        &self,
        actor: &WalletAddress,
        subject: &WalletAddress,
    ) -> Result<Option<TrackingEvent>, StorageError> {
        match self {
            Self::Postgres(pg) => pg.find_track_event(actor, subject).await,
            Self::Memory(mem) => Ok(mem.find_track_event(actor, subject).await),
        }
    }

    /// Aggregates tracking counts for an actor wallet.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn tracking_stats(
        &self,
        actor: &WalletAddress,
    ) -> Result<TrackingStats, StorageError> {
        match self {
            Self::Postgres(pg) => pg.tracking_stats(actor).await,
            Self::Memory(mem) => Ok(mem.tracking_stats(actor).await),
        }
    }

    /// Inserts a referral link, or returns the one already stored for the
    /// same ordered pair.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn insert_referral(
        &self,
        link: &ReferralLink,
    ) -> Result<InsertOutcome<ReferralLink>, StorageError> {
        match self {
            Self::Postgres(pg) => pg.insert_referral(link).await,
            Self::Memory(mem) => mem.insert_referral(link).await,
        }
    }

    /// Finds the referral link for an ordered pair, in any status.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn find_referral(
        &self,
        referrer: &WalletAddress,
        referee: &WalletAddress,
    ) -> Result<Option<ReferralLink>, StorageError> {
        match self {
            Self::Postgres(pg) => pg.find_referral(referrer, referee).await,
            Self::Memory(mem) => Ok(mem.find_referral(referrer, referee).await),
        }
    }

    /// Lists `completed` referrals made by `referrer`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on backend failure.
    pub async fn completed_referrals(
        &self,
        referrer: &WalletAddress,
    ) -> Result<Vec<ReferralLink>, StorageError> {
        match self {
            Self::Postgres(pg) => pg.completed_referrals(referrer).await,
            Self::Memory(mem) => Ok(mem.completed_referrals(referrer).await),
        }
    }
}
