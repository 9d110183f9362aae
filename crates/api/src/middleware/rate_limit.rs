//! Per-client-IP rate limiting for the authentication endpoints.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use serde_json::json;
use tokio::task::JoinHandle;

use crate::app::AppState;

/// Keyed GCRA limiter shared by all auth requests.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
    trust_forwarded_for: bool,
}

impl RateLimiterState {
    /// Returns `None` for a limit of zero, which disables limiting.
    ///
    /// `X-Forwarded-For` is only consulted when `trust_forwarded_for` is set,
    /// i.e. when the server sits behind a proxy that appends the header.
    pub fn new(rate_limit_per_minute: u32, trust_forwarded_for: bool) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
            trust_forwarded_for,
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// `Err(retry_after_secs)` when the client is over its quota.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.limiter.check_key(&ip).map_err(|not_until| {
            not_until
                .wait_time_from(self.clock.now())
                .as_secs()
                .max(1)
        })
    }

    /// Drops per-IP state whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

/// Prunes idle limiter state every `every` until the runtime shuts down.
pub fn spawn_cleanup(limiter: Arc<RateLimiterState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.retain_recent();
            tracing::debug!(
                tracked_clients = limiter.tracked_clients(),
                "Pruned auth rate limiter state"
            );
        }
    })
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

/// Resolves the client address.
///
/// Without proxy trust this is always the socket peer. With it, the last
/// `X-Forwarded-For` hop (the one appended by the proxy) wins; earlier hops are
/// client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> IpAddr {
    let forwarded = trust_forwarded_for
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| peer.map(|p| p.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = state.auth_rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(req.headers(), peer, limiter.trust_forwarded_for);

    if let Err(retry_after) = limiter.check(ip) {
        tracing::warn!(client_ip = %ip, "Auth rate limit exceeded");
        return rate_limited_response(limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_zero_limit_disables() {
        assert!(RateLimiterState::new(0, false).is_none());
    }

    #[test]
    fn test_exhaustion_per_client() {
        let state = RateLimiterState::new(3, false).unwrap();
        for _ in 0..3 {
            assert!(state.check(ip(1)).is_ok());
        }
        let retry = state.check(ip(1)).unwrap_err();
        assert!(retry >= 1);

        assert!(state.check(ip(2)).is_ok());
    }

    #[test]
    fn test_client_ip_ignores_forwarded_for_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let peer: SocketAddr = "198.51.100.4:5555".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), false), peer.ip());
        assert_eq!(
            client_ip(&HeaderMap::new(), None, false),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn test_client_ip_behind_proxy_uses_last_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 203.0.113.7"));
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        assert_eq!(
            client_ip(&headers, Some(peer), true),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer), true), peer.ip());
    }

    #[test]
    fn test_rotating_forwarded_for_does_not_bypass_limit() {
        let state = RateLimiterState::new(1, false).unwrap();
        let peer: SocketAddr = "198.51.100.4:5555".parse().unwrap();

        let allowed = (0..50u8)
            .filter(|i| {
                let mut headers = HeaderMap::new();
                let spoofed = format!("203.0.113.{i}");
                headers.insert("x-forwarded-for", HeaderValue::from_str(&spoofed).unwrap());
                state
                    .check(client_ip(&headers, Some(peer), state.trust_forwarded_for))
                    .is_ok()
            })
            .count();

        assert_eq!(allowed, 1);
        assert_eq!(state.tracked_clients(), 1);
    }

    #[test]
    fn test_retain_recent_drops_replenished_clients() {
        // 600/min replenishes one cell every 100ms.
        let state = RateLimiterState::new(600, false).unwrap();
        for last in 1..=5 {
            state.check(ip(last)).unwrap();
        }
        assert_eq!(state.tracked_clients(), 5);

        std::thread::sleep(Duration::from_millis(250));
        state.retain_recent();
        assert_eq!(state.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_task_prunes_state() {
        let state = Arc::new(RateLimiterState::new(600, false).unwrap());
        state.check(ip(7)).unwrap();

        let handle = spawn_cleanup(Arc::clone(&state), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(450)).await;
        handle.abort();

        assert_eq!(state.tracked_clients(), 0);
    }

    #[test]
    fn test_rate_limited_response_format() {
        let response = rate_limited_response(20, 60);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    }
}
