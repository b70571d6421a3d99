//! # wallet-tracker-gateway
//!
//! REST backend that records which wallets a user looks at and which wallet
//! referred them, with every mutating call proven by a wallet signature.
//!
//! Callers sign an Ethereum personal message with their wallet key; the
//! gateway recovers the signer and acts on behalf of the *recovered*
//! address only. Uniqueness of track clicks and referral links is enforced
//! by the store, so concurrent duplicates collapse to one record.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── CORS + security headers + tracing (middleware/)
//!     ├── Per-IP rate limiter on /api (middleware/)
//!     ├── Wallet signature gate (auth/)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── TrackingService, ReferralService (service/)
//!     │
//!     └── Store (persistence/)
//!             ├── PostgreSQL
//!             └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod persistence;
pub mod service;
