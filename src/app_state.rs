//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::WalletAuthenticator;
use crate::persistence::Store;
use crate::service::{ReferralService, TrackingService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tracking business logic.
    pub tracking_service: Arc<TrackingService>,
    /// Referral business logic.
    pub referral_service: Arc<ReferralService>,
    /// Signature gate and challenge registry.
    pub authenticator: Arc<WalletAuthenticator>,
}

impl AppState {
    /// Wires the services over one shared `store`.
    #[must_use]
    pub fn new(
        store: Store,
        authenticator: WalletAuthenticator,
        referral_base_url: impl Into<String>,
    ) -> Self {
        Self {
            tracking_service: Arc::new(TrackingService::new(store.clone())),
            referral_service: Arc::new(ReferralService::new(store, referral_base_url)),
            authenticator: Arc::new(authenticator),
        }
    }
}
