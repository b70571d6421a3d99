//! Server-issued, single-use sign-in challenges.
//!
//! [`ChallengeRegistry`] hands out nonces bound to a wallet and a deadline.
//! A nonce is consumed the first time a valid signature over it is
//! presented. State is per-process; expired entries are pruned whenever a
//! new challenge is issued.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use super::message;
use crate::domain::WalletAddress;
use crate::error::AuthError;

/// A challenge returned to the client for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Wallet the challenge is bound to.
    pub wallet_address: WalletAddress,
    /// Single-use nonce.
    pub nonce: String,
    /// Exact text the wallet must sign.
    pub message: String,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// After this instant the nonce is rejected.
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PendingChallenge {
    wallet: WalletAddress,
    expires_at: DateTime<Utc>,
}

/// In-memory registry of outstanding challenges, keyed by nonce.
#[derive(Debug)]
pub struct ChallengeRegistry {
    ttl: Duration,
    pending: Mutex<HashMap<String, PendingChallenge>>,
}

impl ChallengeRegistry {
    /// Creates an empty registry whose challenges live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a new challenge for `wallet` at `now`.
    pub async fn issue(
        &self,
        app_name: &str,
        wallet: &WalletAddress,
        now: DateTime<Utc>,
    ) -> Challenge {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = now + self.ttl;

        let mut pending = self.pending.lock().await;
        pending.retain(|_, entry| entry.expires_at > now);
        pending.insert(
            nonce.clone(),
            PendingChallenge {
                wallet: wallet.clone(),
                expires_at,
            },
        );
        drop(pending);

        Challenge {
            wallet_address: wallet.clone(),
            message: message::challenge_message(app_name, wallet, &nonce, now),
            nonce,
            issued_at: now,
            expires_at,
        }
    }

    /// Consumes `nonce` on behalf of `wallet`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidChallenge`] if the nonce is unknown,
    /// already used, expired, or was issued to a different wallet. A nonce
    /// presented by the wrong wallet stays available to its owner.
    pub async fn consume(
        &self,
        wallet: &WalletAddress,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut pending = self.pending.lock().await;
        let Some(entry) = pending.get(nonce) else {
            return Err(AuthError::InvalidChallenge(
                "challenge is unknown or already used".to_string(),
            ));
        };
        if &entry.wallet != wallet {
            return Err(AuthError::InvalidChallenge(
                "challenge was issued to a different wallet".to_string(),
            ));
        }
        let expired = entry.expires_at <= now;
        pending.remove(nonce);
        if expired {
            return Err(AuthError::InvalidChallenge("challenge has expired".to_string()));
        }
        Ok(())
    }

    /// Number of outstanding challenges, including expired ones not yet
    /// pruned.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Returns `true` if no challenges are outstanding.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
