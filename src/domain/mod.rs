//! Domain layer: wallet identity and the records this service keeps.
//!
//! Every type here is storage-agnostic. Wallet identities are normalized to
//! lowercase on construction, so all comparisons downstream are
//! case-insensitive without further effort.

pub mod record_id;
pub mod referral;
pub mod tracking;
pub mod user;
pub mod wallet_address;

pub use record_id::{ReferralId, TrackingId};
pub use referral::{ReferralLink, ReferralStatus};
pub use tracking::{TrackingEvent, TrackingEventType, TrackingMetadata, TrackingStats};
pub use user::User;
pub use wallet_address::{InvalidWalletAddress, WalletAddress};
