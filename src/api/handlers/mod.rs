//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod referral;
pub mod system;
pub mod tracking;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes mounted under `/api`.
///
/// `state` is handed to the signature gate on the authenticated routes.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(tracking::routes(state.clone()))
        .merge(referral::routes(state))
}
