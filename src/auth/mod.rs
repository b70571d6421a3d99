//! Wallet authentication gate.
//!
//! A mutating request proves its caller by carrying `walletAddress`,
//! `message`, and `signature` in its JSON body. [`WalletAuthenticator`]
//! recovers the signer from the signature, requires it to equal the claimed
//! wallet, and checks that the message is a fresh sign-in message for that
//! wallet. Only the *recovered* address is ever handed downstream, as a
//! [`VerifiedWallet`].

pub mod challenge;
pub mod gate;
pub mod message;
pub mod signature;

use std::time::Duration as StdDuration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

pub use challenge::{Challenge, ChallengeRegistry};
pub use gate::require_wallet_signature;

use crate::domain::WalletAddress;
use crate::error::{AuthError, GatewayError};
use message::MessageProof;

/// Allowed clock skew for timestamps that lie in the future.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

/// Tunables for the gate.
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    /// Application name embedded in the sign-in template.
    pub app_name: String,
    /// When `true`, only server-issued challenges are accepted.
    pub require_nonce: bool,
    /// Lifetime of an issued challenge.
    pub challenge_ttl: StdDuration,
    /// Maximum age of a legacy timestamp message.
    pub message_max_age: StdDuration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            app_name: "SmartWhales.ai".to_string(),
            require_nonce: true,
            challenge_ttl: StdDuration::from_secs(300),
            message_max_age: StdDuration::from_secs(300),
        }
    }
}

/// Credentials carried in the body of an authenticated request.
///
/// Every field is optional so that a missing one is reported as
/// [`AuthError::MissingParameters`] rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthClaim {
    /// Wallet the caller claims to be.
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Hex `r || s || v` signature over `message`.
    #[serde(default)]
    pub signature: Option<String>,
    /// The signed sign-in message.
    #[serde(default)]
    pub message: Option<String>,
}

/// The wallet proven to have signed the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedWallet(pub WalletAddress);

impl VerifiedWallet {
    /// Returns the verified address.
    #[must_use]
    pub fn address(&self) -> &WalletAddress {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for VerifiedWallet {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            GatewayError::Internal("route is not behind the wallet signature gate".to_string())
        })
    }
}

/// Verifies wallet signatures and issues sign-in challenges.
#[derive(Debug)]
pub struct WalletAuthenticator {
    policy: AuthPolicy,
    challenges: ChallengeRegistry,
}

impl WalletAuthenticator {
    /// Creates an authenticator with an empty challenge registry.
    #[must_use]
    pub fn new(policy: AuthPolicy) -> Self {
        let ttl = Duration::from_std(policy.challenge_ttl).unwrap_or(Duration::minutes(5));
        Self {
            policy,
            challenges: ChallengeRegistry::new(ttl),
        }
    }

    /// Issues a sign-in challenge for `wallet`.
    pub async fn issue_challenge(&self, wallet: &WalletAddress) -> Challenge {
        self.challenges
            .issue(&self.policy.app_name, wallet, Utc::now())
            .await
    }

    /// Verifies a claim and returns the recovered wallet.
    ///
    /// The signature is checked before the message freshness, so a forged
    /// request never consumes a legitimate nonce.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] describing the first check that failed.
    pub async fn verify(&self, claim: &AuthClaim) -> Result<VerifiedWallet, AuthError> {
        let (Some(wallet), Some(signature), Some(message)) = (
            non_empty(claim.wallet_address.as_deref()),
            non_empty(claim.signature.as_deref()),
            claim.message.as_deref(),
        ) else {
            return Err(AuthError::MissingParameters);
        };
        // The signed bytes are exactly what the wallet sent, whitespace included.
        if message.trim().is_empty() {
            return Err(AuthError::MissingParameters);
        }

        let claimed = WalletAddress::parse(wallet)
            .map_err(|_| AuthError::InvalidClaimedAddress(wallet.to_string()))?;
        let recovered = signature::recover_signer(message, signature)?;
        if recovered != claimed {
            return Err(AuthError::SignatureMismatch);
        }

        self.check_message(&recovered, message, Utc::now()).await?;
        Ok(VerifiedWallet(recovered))
    }

    async fn check_message(
        &self,
        signer: &WalletAddress,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let parsed = message::parse(&self.policy.app_name, text).ok_or_else(|| {
            AuthError::InvalidChallenge("message does not follow the sign-in template".to_string())
        })?;
        if &parsed.wallet != signer {
            return Err(AuthError::InvalidChallenge(
                "message was written for a different wallet".to_string(),
            ));
        }

        match parsed.proof {
            MessageProof::Nonce(nonce) => self.challenges.consume(signer, &nonce, now).await,
            MessageProof::Timestamp(_) if self.policy.require_nonce => Err(
                AuthError::InvalidChallenge("a server-issued challenge is required".to_string()),
            ),
            MessageProof::Timestamp(signed_at) => {
                let max_age =
                    Duration::from_std(self.policy.message_max_age).unwrap_or(Duration::minutes(5));
                if now - signed_at > max_age {
                    return Err(AuthError::InvalidChallenge("message has expired".to_string()));
                }
                if signed_at - now > Duration::seconds(MAX_FUTURE_SKEW_SECS) {
                    return Err(AuthError::InvalidChallenge(
                        "message timestamp is in the future".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
