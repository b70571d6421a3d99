//! In-process store with the same uniqueness rules as the SQL schema.
//!
//! All tables sit behind a single [`tokio::sync::RwLock`], so every
//! check-and-insert happens under one write guard and concurrent duplicate
//! inserts resolve to exactly one record. Used when persistence is disabled
//! and throughout the test suite.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::InsertOutcome;
use crate::domain::{
    ReferralLink, ReferralStatus, TrackingEvent, TrackingEventType, TrackingStats, User,
    WalletAddress,
};
use crate::error::StorageError;

type Pair = (WalletAddress, WalletAddress);

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<WalletAddress, User>,
    tracking_events: Vec<TrackingEvent>,
    track_pairs: HashMap<Pair, TrackingEvent>,
    referral_links: Vec<ReferralLink>,
    referral_pairs: HashMap<Pair, ReferralLink>,
}

/// Volatile store backed by in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the user or refreshes its `last_seen`.
    pub async fn touch_user(&self, wallet: &WalletAddress, at: DateTime<Utc>) -> User {
        let mut tables = self.tables.write().await;
        let user = tables.users.entry(wallet.clone()).or_insert_with(|| User {
            wallet_address: wallet.clone(),
            last_seen: at,
        });
        user.last_seen = user.last_seen.max(at);
        user.clone()
    }

    /// Looks up a user.
    pub async fn find_user(&self, wallet: &WalletAddress) -> Option<User> {
        self.tables.read().await.users.get(wallet).cloned()
    }

    /// Appends a tracking event.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] if `event` is a `track` event for
    /// a pair that already has one.
    pub async fn insert_tracking_event(
        &self,
        event: &TrackingEvent,
    ) -> Result<TrackingEvent, StorageError> {
        match self.insert_track_or_input(event).await {
            InsertOutcome::Created(created) => Ok(created),
            InsertOutcome::Existing(_) => Err(StorageError::Conflict(format!(
                "duplicate track event {} -> {}",
                event.wallet_address, event.tracked_address
            ))),
        }
    }

    /// Inserts a `track` event unless one already exists for the pair.
    pub async fn insert_track_event(&self, event: &TrackingEvent) -> InsertOutcome<TrackingEvent> {
        let mut event = event.clone();
        event.event_type = TrackingEventType::Track;
        self.insert_track_or_input(&event).await
    }

    async fn insert_track_or_input(&self, event: &TrackingEvent) -> InsertOutcome<TrackingEvent> {
        let mut tables = self.tables.write().await;
        if event.event_type == TrackingEventType::Track {
            let pair = (event.wallet_address.clone(), event.tracked_address.clone());
            if let Some(existing) = tables.track_pairs.get(&pair) {
                return InsertOutcome::Existing(existing.clone());
            }
            tables.track_pairs.insert(pair, event.clone());
        }
        tables.tracking_events.push(event.clone());
        InsertOutcome::Created(event.clone())
    }

    /// Finds the `track` event for an (actor, subject) pair.
    pub async fn find_track_event(
        &self,
        actor: &WalletAddress,
        subject: &WalletAddress,
    ) -> Option<TrackingEvent> {
        self.tables
            .read()
            .await
            .track_pairs
            .get(&(actor.clone(), subject.clone()))
            .cloned()
    }

    /// Aggregates tracking counts for an actor wallet.
    pub async fn tracking_stats(&self, actor: &WalletAddress) -> TrackingStats {
        let tables = self.tables.read().await;
        let mut stats = TrackingStats::default();
        let mut tracked = HashSet::new();
        for event in tables
            .tracking_events
            .iter()
            .filter(|e| &e.wallet_address == actor)
        {
            match event.event_type {
                TrackingEventType::Input => stats.input_count += 1,
                TrackingEventType::Track => stats.track_count += 1,
            }
            tracked.insert(&event.tracked_address);
        }
        stats.unique_wallets_tracked = tracked.len() as u64;
        stats
    }

    /// Inserts a referral link unless the ordered pair already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Conflict`] for a self-referral, mirroring the
    /// SQL check constraint.
    pub async fn insert_referral(
        &self,
        link: &ReferralLink,
    ) -> Result<InsertOutcome<ReferralLink>, StorageError> {
        if link.referrer == link.referee {
            return Err(StorageError::Conflict(format!(
                "self-referral for {}",
                link.referrer
            )));
        }

        let mut tables = self.tables.write().await;
        let pair = (link.referrer.clone(), link.referee.clone());
        if let Some(existing) = tables.referral_pairs.get(&pair) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        tables.referral_pairs.insert(pair, link.clone());
        tables.referral_links.push(link.clone());
        Ok(InsertOutcome::Created(link.clone()))
    }

    /// Finds the referral link for an ordered pair, in any status.
    pub async fn find_referral(
        &self,
        referrer: &WalletAddress,
        referee: &WalletAddress,
    ) -> Option<ReferralLink> {
        self.tables
            .read()
            .await
            .referral_pairs
            .get(&(referrer.clone(), referee.clone()))
            .cloned()
    }

    /// Lists `completed` referrals made by `referrer`, oldest first.
    pub async fn completed_referrals(&self, referrer: &WalletAddress) -> Vec<ReferralLink> {
        self.tables
            .read()
            .await
            .referral_links
            .iter()
            .filter(|l| &l.referrer == referrer && l.status == ReferralStatus::Completed)
            .cloned()
            .collect()
    }
}
