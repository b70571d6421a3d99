//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{
    ErrorEnvelope, ReferralCountResponse, ReferralLinkResponse, ReferredWallet, ReferrerRequest,
    TrackRequest, TrackingAck, VerifyReferralResponse,
};
use super::handlers;
use crate::auth::{AuthClaim, Challenge};
use crate::domain::{ReferralLink, ReferralStatus, TrackingMetadata, TrackingStats};

/// Collected OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "wallet-tracker-gateway",
        description = "Wallet-authenticated tracking and referral API. Mutating routes carry `walletAddress`, `message`, and `signature` in the JSON body."
    ),
    paths(
        handlers::system::health_handler,
        handlers::auth::issue_challenge,
        handlers::tracking::record_input,
        handlers::tracking::record_track_click,
        handlers::tracking::get_stats,
        handlers::referral::log_referral,
        handlers::referral::get_referral_count,
        handlers::referral::verify_connection,
        handlers::referral::get_referral_link,
    ),
    components(schemas(
        AuthClaim,
        Challenge,
        ErrorEnvelope,
        ReferralCountResponse,
        ReferralLink,
        ReferralLinkResponse,
        ReferralStatus,
        ReferredWallet,
        ReferrerRequest,
        TrackRequest,
        TrackingAck,
        TrackingMetadata,
        TrackingStats,
        VerifyReferralResponse,
    )),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Auth", description = "Sign-in challenges"),
        (name = "Tracking", description = "Wallet inputs, track clicks, and stats"),
        (name = "Referral", description = "Referral links between wallets"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/health",
            "/api/auth/challenge/{wallet_address}",
            "/api/tracking/input",
            "/api/tracking/click",
            "/api/tracking/stats/{wallet_address}",
            "/api/referral/log",
            "/api/referral/count/{wallet_address}",
            "/api/referral/verify",
            "/api/referral/link/{wallet_address}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
