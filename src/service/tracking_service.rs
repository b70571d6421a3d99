//! Tracking service: records wallet inputs and track clicks.

use chrono::Utc;

use crate::domain::{
    TrackingEvent, TrackingEventType, TrackingMetadata, TrackingStats, WalletAddress,
};
use crate::error::GatewayError;
use crate::persistence::{InsertOutcome, Store};

/// Records and reports tracking interactions.
///
/// `input` events are appended on every call. `track` events are
/// idempotent per (actor, subject): the store's uniqueness rule decides the
/// winner, and later calls get the winning record back.
#[derive(Debug, Clone)]
pub struct TrackingService {
    store: Store,
}

impl TrackingService {
    /// Creates a new `TrackingService`.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Records that `actor` submitted `subject`. Always writes a new event.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on persistence failure.
    pub async fn record_input(
        &self,
        actor: &WalletAddress,
        subject: &WalletAddress,
        metadata: TrackingMetadata,
    ) -> Result<TrackingEvent, GatewayError> {
        self.store.touch_user(actor, Utc::now()).await?;

        let event = TrackingEvent::new(
            actor.clone(),
            subject.clone(),
            TrackingEventType::Input,
            metadata,
        );
        let stored = self.store.insert_tracking_event(&event).await?;

        tracing::info!(tracking_id = %stored.id, %actor, %subject, "wallet input recorded");
        Ok(stored)
    }

    /// Records that `actor` chose to track `subject`.
    ///
    /// An existing `track` event for the pair short-circuits with no write.
    /// Otherwise the actor's user record is refreshed and the event inserted;
    /// if a concurrent call wins the insert, its record is returned as
    /// [`InsertOutcome::Existing`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on persistence failure.
    pub async fn record_track_click(
        &self,
        actor: &WalletAddress,
        subject: &WalletAddress,
        metadata: TrackingMetadata,
    ) -> Result<InsertOutcome<TrackingEvent>, GatewayError> {
        if let Some(existing) = self.store.find_track_event(actor, subject).await? {
            tracing::debug!(tracking_id = %existing.id, %actor, %subject, "wallet already tracked");
            return Ok(InsertOutcome::Existing(existing));
        }

        self.store.touch_user(actor, Utc::now()).await?;

        let event = TrackingEvent::new(
            actor.clone(),
            subject.clone(),
            TrackingEventType::Track,
            metadata,
        );
        let outcome = self.store.insert_track_event(&event).await?;

        match &outcome {
            InsertOutcome::Created(stored) => {
                tracing::info!(tracking_id = %stored.id, %actor, %subject, "track click recorded");
            }
            InsertOutcome::Existing(stored) => {
                tracing::debug!(
                    tracking_id = %stored.id,
                    %actor,
                    %subject,
                    "track click lost insert race"
                );
            }
        }
        Ok(outcome)
    }

    /// Returns the tracking counts for `wallet` acting as the actor.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Storage`] on persistence failure.
    pub async fn stats(&self, wallet: &WalletAddress) -> Result<TrackingStats, GatewayError> {
        Ok(self.store.tracking_stats(wallet).await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> WalletAddress {
        WalletAddress::from_bytes([byte; 20])
    }

    fn make_service() -> (TrackingService, Store) {
        let store = Store::in_memory();
        (TrackingService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn track_click_is_idempotent() {
        let (service, _) = make_service();
        let Ok(first) = service
            .record_track_click(&addr(1), &addr(2), TrackingMetadata::default())
            .await
        else {
            panic!("first click failed");
        };
        let Ok(second) = service
            .record_track_click(&addr(1), &addr(2), TrackingMetadata::default())
            .await
        else {
            panic!("second click failed");
        };

        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.into_inner().id, second.into_inner().id);

        let stats = service.stats(&addr(1)).await.ok();
        assert_eq!(stats.map(|s| s.track_count), Some(1));
    }

    #[tokio::test]
    async fn inputs_are_never_deduplicated() {
        let (service, _) = make_service();
        for _ in 0..5 {
            let result = service
                .record_input(&addr(1), &addr(2), TrackingMetadata::default())
                .await;
            assert!(result.is_ok());
        }
        let stats = service.stats(&addr(1)).await.ok();
        assert_eq!(stats.map(|s| s.input_count), Some(5));
    }

    #[tokio::test]
    async fn stats_count_distinct_subjects() {
        let (service, _) = make_service();
        let w = addr(9);
        let meta = TrackingMetadata::default;
        assert!(service.record_input(&w, &addr(1), meta()).await.is_ok());
        assert!(service.record_track_click(&w, &addr(1), meta()).await.is_ok());
        assert!(service.record_input(&w, &addr(2), meta()).await.is_ok());

        let Ok(stats) = service.stats(&w).await else {
            panic!("stats failed");
        };
        assert_eq!(
            stats,
            TrackingStats {
                input_count: 2,
                track_count: 1,
                unique_wallets_tracked: 2,
            }
        );
    }

    #[tokio::test]
    async fn stats_are_scoped_to_the_actor() {
        let (service, _) = make_service();
        assert!(service
            .record_input(&addr(1), &addr(2), TrackingMetadata::default())
            .await
            .is_ok());
        let stats = service.stats(&addr(2)).await.ok();
        assert_eq!(stats, Some(TrackingStats::default()));
    }

    #[tokio::test]
    async fn recording_touches_the_actor() {
        let (service, store) = make_service();
        assert!(service
            .record_input(&addr(4), &addr(5), TrackingMetadata::default())
            .await
            .is_ok());
        let user = store.find_user(&addr(4)).await.ok().flatten();
        assert!(user.is_some());
        let subject = store.find_user(&addr(5)).await.ok().flatten();
        assert!(subject.is_none());
    }

    #[tokio::test]
    async fn duplicate_click_performs_no_write() {
        let (service, store) = make_service();
        assert!(service
            .record_track_click(&addr(1), &addr(2), TrackingMetadata::default())
            .await
            .is_ok());
        let Ok(Some(before)) = store.find_user(&addr(1)).await else {
            panic!("user missing");
        };
        assert!(service
            .record_track_click(&addr(1), &addr(2), TrackingMetadata::default())
            .await
            .is_ok());
        let Ok(Some(after)) = store.find_user(&addr(1)).await else {
            panic!("user missing");
        };
        assert_eq!(before.last_seen, after.last_seen);
    }
}
