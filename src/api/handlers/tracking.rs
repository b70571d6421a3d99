//! Tracking handlers: record inputs and track clicks, report stats.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use crate::api::dto::{ApiEnvelope, ErrorEnvelope, TrackRequest, TrackingAck, path_address};
use crate::api::extract::ApiJson;
use crate::app_state::AppState;
use crate::auth::{VerifiedWallet, require_wallet_signature};
use crate::domain::{TrackingMetadata, TrackingStats};
use crate::error::GatewayError;
use crate::middleware::ClientIp;

/// `POST /tracking/input` — Record that the caller submitted an address.
///
/// # Errors
///
/// Returns [`GatewayError`] on authentication, validation, or storage
/// failure.
#[utoipa::path(
    post,
    path = "/api/tracking/input",
    tag = "Tracking",
    summary = "Record a wallet input",
    description = "Appends an `input` event for the verified caller. Inputs are never deduplicated.",
    request_body = TrackRequest,
    responses(
        (status = 201, description = "Input recorded", body = ApiEnvelope<TrackingAck>),
        (status = 400, description = "Missing or invalid trackedAddress", body = ErrorEnvelope),
        (status = 401, description = "Signature check failed", body = ErrorEnvelope),
    )
)]
pub async fn record_input(
    State(state): State<AppState>,
    caller: VerifiedWallet,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<TrackRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let subject = req.tracked_address()?;
    let metadata = request_metadata(req.metadata, &headers, client_ip);

    let event = state
        .tracking_service
        .record_input(caller.address(), &subject, metadata)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(
            "Wallet input tracked successfully",
            TrackingAck {
                tracking_id: event.id,
            },
        )),
    ))
}

/// `POST /tracking/click` — Record that the caller tracks an address.
///
/// # Errors
///
/// Returns [`GatewayError`] on authentication, validation, or storage
/// failure.
#[utoipa::path(
    post,
    path = "/api/tracking/click",
    tag = "Tracking",
    summary = "Record a track click",
    description = "Records a `track` event once per (caller, trackedAddress). Repeats return the original id with 200.",
    request_body = TrackRequest,
    responses(
        (status = 201, description = "Track click recorded", body = ApiEnvelope<TrackingAck>),
        (status = 200, description = "Wallet already tracked", body = ApiEnvelope<TrackingAck>),
        (status = 400, description = "Missing or invalid trackedAddress", body = ErrorEnvelope),
        (status = 401, description = "Signature check failed", body = ErrorEnvelope),
    )
)]
pub async fn record_track_click(
    State(state): State<AppState>,
    caller: VerifiedWallet,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<TrackRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let subject = req.tracked_address()?;
    let metadata = request_metadata(req.metadata, &headers, client_ip);

    let outcome = state
        .tracking_service
        .record_track_click(caller.address(), &subject, metadata)
        .await?;

    let (status, message) = if outcome.is_created() {
        (StatusCode::CREATED, "Wallet track click recorded successfully")
    } else {
        (StatusCode::OK, "Wallet already tracked")
    };
    let ack = TrackingAck {
        tracking_id: outcome.into_inner().id,
    };
    Ok((status, Json(ApiEnvelope::ok_with_message(message, ack))))
}

/// `GET /tracking/stats/{wallet_address}` — Tracking counts for a wallet.
///
/// # Errors
///
/// Returns [`GatewayError`] on an invalid address or storage failure.
#[utoipa::path(
    get,
    path = "/api/tracking/stats/{wallet_address}",
    tag = "Tracking",
    summary = "Get tracking stats",
    description = "Counts the wallet's input events, track events, and distinct tracked addresses.",
    params(
        ("wallet_address" = String, Path, description = "Wallet acting as the tracker"),
    ),
    responses(
        (status = 200, description = "Tracking stats", body = ApiEnvelope<TrackingStats>),
        (status = 400, description = "Invalid wallet address", body = ErrorEnvelope),
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = path_address("walletAddress", &wallet_address)?;
    let stats = state.tracking_service.stats(&wallet).await?;
    Ok(Json(ApiEnvelope::ok(stats)))
}

/// Body metadata, with `userAgent` and `ip` filled from the request when
/// the client left them out.
fn request_metadata(
    body: Option<TrackingMetadata>,
    headers: &HeaderMap,
    client_ip: Option<Extension<ClientIp>>,
) -> TrackingMetadata {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip = client_ip.map(|Extension(ClientIp(ip))| ip.to_string());
    body.unwrap_or_default().with_request_defaults(user_agent, ip)
}

/// Tracking routes; `input` and `click` sit behind the signature gate.
pub fn routes(state: AppState) -> Router<AppState> {
    let signed = Router::new()
        .route("/tracking/input", post(record_input))
        .route("/tracking/click", post(record_track_click))
        .route_layer(from_fn_with_state(state, require_wallet_signature));

    Router::new()
        .merge(signed)
        .route("/tracking/stats/{wallet_address}", get(get_stats))
}
