//! Referral handlers: log, count, verify, and link generation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ApiEnvelope, ErrorEnvelope, ReferralCountResponse, ReferralLinkResponse, ReferrerRequest,
    VerifyReferralResponse, path_address,
};
use crate::api::extract::ApiJson;
use crate::app_state::AppState;
use crate::auth::{VerifiedWallet, require_wallet_signature};
use crate::domain::ReferralLink;
use crate::error::GatewayError;

/// `POST /referral/log` — Record that `referrerAddress` referred the caller.
///
/// # Errors
///
/// Returns [`GatewayError`] on authentication or validation failure,
/// self-referral, or storage failure.
#[utoipa::path(
    post,
    path = "/api/referral/log",
    tag = "Referral",
    summary = "Log a referral",
    description = "Links referrerAddress → verified caller once. Repeats return the stored link with 200.",
    request_body = ReferrerRequest,
    responses(
        (status = 201, description = "Referral logged", body = ApiEnvelope<ReferralLink>),
        (status = 200, description = "Referral already recorded", body = ApiEnvelope<ReferralLink>),
        (status = 400, description = "Missing referrer or self-referral", body = ErrorEnvelope),
        (status = 401, description = "Signature check failed", body = ErrorEnvelope),
    )
)]
pub async fn log_referral(
    State(state): State<AppState>,
    caller: VerifiedWallet,
    ApiJson(req): ApiJson<ReferrerRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let referrer = req.referrer_address()?;
    let outcome = state
        .referral_service
        .log_referral(&referrer, caller.address())
        .await?;

    let (status, message) = if outcome.is_created() {
        (StatusCode::CREATED, "Referral logged successfully")
    } else {
        (StatusCode::OK, "Referral already recorded")
    };
    Ok((
        status,
        Json(ApiEnvelope::ok_with_message(message, outcome.into_inner())),
    ))
}

/// `GET /referral/count/{wallet_address}` — Completed referrals by a wallet.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid address or storage failure.
#[utoipa::path(
    get,
    path = "/api/referral/count/{wallet_address}",
    tag = "Referral",
    summary = "Count referrals",
    description = "Returns the number of completed referrals made by the wallet and the referred wallets.",
    params(
        ("wallet_address" = String, Path, description = "Referrer wallet"),
    ),
    responses(
        (status = 200, description = "Referral count", body = ApiEnvelope<ReferralCountResponse>),
        (status = 400, description = "Invalid wallet address", body = ErrorEnvelope),
    )
)]
pub async fn get_referral_count(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let referrer = path_address("walletAddress", &wallet_address)?;
    let links = state.referral_service.referrals_by(&referrer).await?;
    Ok(Json(ApiEnvelope::ok(ReferralCountResponse::from(links))))
}

/// `POST /referral/verify` — Whether `referrerAddress` referred the caller.
///
/// # Errors
///
/// Returns [`GatewayError`] on authentication or validation failure, or
/// storage failure.
#[utoipa::path(
    post,
    path = "/api/referral/verify",
    tag = "Referral",
    summary = "Verify a referral",
    description = "Checks for a completed referrerAddress → verified caller link. Direction matters.",
    request_body = ReferrerRequest,
    responses(
        (
            status = 200,
            description = "Verification result",
            body = ApiEnvelope<VerifyReferralResponse>
        ),
        (status = 400, description = "Missing or invalid referrerAddress", body = ErrorEnvelope),
        (status = 401, description = "Signature check failed", body = ErrorEnvelope),
    )
)]
pub async fn verify_connection(
    State(state): State<AppState>,
    caller: VerifiedWallet,
    ApiJson(req): ApiJson<ReferrerRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let referrer = req.referrer_address()?;
    let referral = state
        .referral_service
        .verify_connection(&referrer, caller.address())
        .await?;
    Ok(Json(ApiEnvelope::ok(VerifyReferralResponse::from(referral))))
}

/// `GET /referral/link/{wallet_address}` — Shareable referral link.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid address.
#[utoipa::path(
    get,
    path = "/api/referral/link/{wallet_address}",
    tag = "Referral",
    summary = "Get referral link",
    description = "Renders the frontend URL that carries the wallet as the `ref` query parameter.",
    params(
        ("wallet_address" = String, Path, description = "Referrer wallet"),
    ),
    responses(
        (status = 200, description = "Referral link", body = ApiEnvelope<ReferralLinkResponse>),
        (status = 400, description = "Invalid wallet address", body = ErrorEnvelope),
    )
)]
pub async fn get_referral_link(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = path_address("walletAddress", &wallet_address)?;
    Ok(Json(ApiEnvelope::ok(ReferralLinkResponse {
        referral_link: state.referral_service.referral_link(&wallet),
    })))
}

/// Referral routes; `log` and `verify` sit behind the signature gate.
pub fn routes(state: AppState) -> Router<AppState> {
    let signed = Router::new()
        .route("/referral/log", post(log_referral))
        .route("/referral/verify", post(verify_connection))
        .route_layer(from_fn_with_state(state, require_wallet_signature));

    Router::new()
        .merge(signed)
        .route("/referral/count/{wallet_address}", get(get_referral_count))
        .route("/referral/link/{wallet_address}", get(get_referral_link))
}
