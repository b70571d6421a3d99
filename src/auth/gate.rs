//! Axum middleware that enforces the wallet signature on a route.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::AuthClaim;
use crate::app_state::AppState;
use crate::error::{GatewayError, ValidationError};

/// Largest body the gate will buffer.
pub const MAX_SIGNED_BODY_BYTES: usize = 64 * 1024;

/// Verifies the caller's wallet signature and attaches the recovered
/// [`super::VerifiedWallet`] to the request extensions.
///
/// The body is buffered so the downstream handler can still deserialize
/// its own fields from it. A body that is not JSON is treated as carrying
/// no credentials.
///
/// # Errors
///
/// Returns [`GatewayError::Auth`] when verification fails and
/// [`GatewayError::Validation`] when the body exceeds
/// [`MAX_SIGNED_BODY_BYTES`].
pub async fn require_wallet_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_SIGNED_BODY_BYTES)
        .await
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;

    let claim: AuthClaim = serde_json::from_slice(&bytes).unwrap_or_default();
    let verified = match state.authenticator.verify(&claim).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                path = %parts.uri.path(),
                claimed = claim.wallet_address.as_deref().unwrap_or("<none>"),
                error = %err,
                "wallet authentication rejected"
            );
            return Err(err.into());
        }
    };
    tracing::debug!(wallet = %verified.address(), "wallet signature verified");

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(verified);
    Ok(next.run(request).await)
}
