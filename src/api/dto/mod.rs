//! Data Transfer Objects for REST request/response serialization.
//!
//! Request bodies keep every field optional so that an absent field is
//! reported as a validation error naming it, not as a JSON parse failure.

pub mod common_dto;
pub mod referral_dto;
pub mod tracking_dto;

pub use common_dto::*;
pub use referral_dto::*;
pub use tracking_dto::*;
