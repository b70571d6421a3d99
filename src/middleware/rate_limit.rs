//! Fixed-window request limiter keyed by client IP.
//!
//! Each IP gets `max_requests` per window; the window starts on the first
//! request and resets once it has fully elapsed. Expired windows are pruned
//! lazily while serving requests. The resolved IP is attached to the
//! request as [`ClientIp`] for handlers that record it.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::GatewayError;

/// Client IP as resolved by the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Windows {
    by_ip: HashMap<IpAddr, Window>,
    last_prune: Instant,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request fits in the current window.
    pub allowed: bool,
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateDecision {
    /// Whole seconds until reset, rounded up.
    #[must_use]
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs.saturating_add(1)
        } else {
            secs
        }
    }

    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(
            HeaderName::from_static("ratelimit-limit"),
            HeaderValue::from(self.limit),
        );
        headers.insert(
            HeaderName::from_static("ratelimit-remaining"),
            HeaderValue::from(self.remaining),
        );
        headers.insert(
            HeaderName::from_static("ratelimit-reset"),
            HeaderValue::from(self.reset_secs()),
        );
    }
}

/// Shared fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<Windows>>,
    max_requests: u32,
    window: Duration,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window` per IP.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration, trust_proxy_headers: bool) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows {
                by_ip: HashMap::new(),
                last_prune: Instant::now(),
            })),
            max_requests,
            window,
            trust_proxy_headers,
        }
    }

    /// Counts one request from `ip`.
    pub async fn check(&self, ip: IpAddr) -> RateDecision {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: IpAddr, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().await;

        if now.saturating_duration_since(windows.last_prune) >= self.window {
            let span = self.window;
            windows
                .by_ip
                .retain(|_, w| now.saturating_duration_since(w.started) < span);
            windows.last_prune = now;
        }

        let entry = windows.by_ip.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        RateDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started)),
        }
    }

    /// Number of IPs currently holding a window.
    pub async fn tracked_ips(&self) -> usize {
        self.windows.lock().await.by_ip.len()
    }

    /// Resolves the client IP. Proxy headers are consulted first only when
    /// configured to trust them; otherwise the socket peer is used.
    #[must_use]
    pub fn client_ip(&self, request: &Request) -> Option<IpAddr> {
        if self.trust_proxy_headers
            && let Some(ip) = forwarded_ip(request.headers())
        {
            return Some(ip);
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    }
}

/// Middleware applying the limiter to every request it wraps.
///
/// Requests whose IP cannot be determined are passed through uncounted.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(ip) = limiter.client_ip(&request) else {
        return next.run(request).await;
    };
    request.extensions_mut().insert(ClientIp(ip));

    let decision = limiter.check(ip).await;
    if !decision.allowed {
        warn!(%ip, limit = decision.limit, "rate limit exceeded");
        let mut response = GatewayError::RateLimited {
            retry_after_secs: decision.reset_secs().max(1),
        }
        .into_response();
        decision.write_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    decision.write_headers(response.headers_mut());
    response
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    from_forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    })
}
