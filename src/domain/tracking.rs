//! Tracking events: one wallet showing interest in another.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{TrackingId, WalletAddress};

/// Kind of tracking interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackingEventType {
    /// The actor typed or submitted an address. Never deduplicated.
    Input,
    /// The actor confirmed intent to track an address. At most one per
    /// (actor, subject) pair.
    Track,
}

impl TrackingEventType {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Track => "track",
        }
    }
}

impl fmt::Display for TrackingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "track" => Ok(Self::Track),
            other => Err(format!("unknown tracking event type: {other}")),
        }
    }
}

/// Descriptive attributes captured with an event. Never used for
/// business logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingMetadata {
    /// Chain the client was connected to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Client IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl TrackingMetadata {
    /// Fills `user_agent` and `ip` from the request when the client left
    /// them out.
    #[must_use]
    pub fn with_request_defaults(mut self, user_agent: Option<String>, ip: Option<String>) -> Self {
        if self.user_agent.is_none() {
            self.user_agent = user_agent;
        }
        if self.ip.is_none() {
            self.ip = ip;
        }
        self
    }
}

/// A tracking event. Stored once; never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Record id.
    pub id: TrackingId,
    /// Actor wallet.
    pub wallet_address: WalletAddress,
    /// Subject wallet.
    pub tracked_address: WalletAddress,
    /// Interaction kind.
    pub event_type: TrackingEventType,
    /// Descriptive attributes.
    pub metadata: TrackingMetadata,
    /// Creation time. Immutable.
    pub timestamp: DateTime<Utc>,
}

impl TrackingEvent {
    /// Builds a new event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(
        wallet_address: WalletAddress,
        tracked_address: WalletAddress,
        event_type: TrackingEventType,
        metadata: TrackingMetadata,
    ) -> Self {
        Self {
            id: TrackingId::new(),
            wallet_address,
            tracked_address,
            event_type,
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Aggregate counts for one actor wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStats {
    /// Number of `input` events.
    pub input_count: u64,
    /// Number of `track` events.
    pub track_count: u64,
    /// Number of distinct tracked addresses across all event types.
    pub unique_wallets_tracked: u64,
}
