//! Sign-in challenge endpoint.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ApiEnvelope, ErrorEnvelope, path_address};
use crate::app_state::AppState;
use crate::auth::Challenge;
use crate::error::GatewayError;

/// `GET /auth/challenge/{wallet_address}` — Issue a single-use sign-in
/// message for a wallet.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid address.
#[utoipa::path(
    get,
    path = "/api/auth/challenge/{wallet_address}",
    tag = "Auth",
    summary = "Issue a sign-in challenge",
    description = "Returns a message carrying a fresh nonce. Sign it with the wallet and send it with the next authenticated request; each nonce works once.",
    params(
        ("wallet_address" = String, Path, description = "Wallet that will sign"),
    ),
    responses(
        (status = 200, description = "Challenge issued", body = ApiEnvelope<Challenge>),
        (status = 400, description = "Invalid wallet address", body = ErrorEnvelope),
    )
)]
pub async fn issue_challenge(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = path_address("walletAddress", &wallet_address)?;
    let challenge = state.authenticator.issue_challenge(&wallet).await;
    tracing::debug!(%wallet, expires_at = %challenge.expires_at, "challenge issued");
    Ok(Json(ApiEnvelope::ok(challenge)))
}

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/challenge/{wallet_address}", get(issue_challenge))
}
