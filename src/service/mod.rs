//! Service layer: business logic over the [`crate::persistence::Store`].
//!
//! Services are stateless; each holds a clone of the store handle passed in
//! at startup.

pub mod referral_service;
pub mod tracking_service;

pub use referral_service::ReferralService;
pub use tracking_service::TrackingService;
