//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api` behind the per-IP rate
//! limiter; `/health` and the API docs sit at the root. CORS, security
//! headers, and request tracing wrap everything.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::middleware::from_fn_with_state;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::middleware::{RateLimiter, cors_layer, enforce_rate_limit, security_headers};

pub use openapi::ApiDoc;

/// Builds the `/api` router with all resource endpoints.
pub fn build_router(state: AppState, limiter: RateLimiter) -> Router<AppState> {
    Router::new()
        .nest("/api", handlers::routes(state))
        .layer(from_fn_with_state(limiter, enforce_rate_limit))
        .merge(handlers::system::routes())
}

/// Builds the complete application: routes, docs, and cross-cutting layers.
pub fn build_app(state: AppState, config: &GatewayConfig) -> Router {
    let limiter = RateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window(),
        config.rate_limit_trust_proxy_headers,
    );

    let router = build_router(state.clone(), limiter);

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
    };

    security_headers(router)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
