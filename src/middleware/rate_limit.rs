use std::collections::HashMap;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::config::RateLimitTier;
use crate::error::ApiError;
use crate::state::AppState;

/// Outcome of counting one request against a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

/// Counter storage for fixed-window limiting
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn hit(&self, key: &str, tier: &RateLimitTier, now: Instant) -> RateDecision;
}

struct Window {
    started: Instant,
    length: Duration,
    count: u32,
}

impl Window {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.started) < self.length
    }
}

/// Windows of every tier share one map; each window remembers its own length
#[derive(Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(&self, key: &str, tier: &RateLimitTier, now: Instant) -> RateDecision {
        let length = Duration::from_secs(tier.window_secs);
        let mut windows = self.windows.lock().await;

        windows.retain(|_, w| w.is_live(now));

        let window = windows.entry(key.to_string()).or_insert(Window { started: now, length, count: 0 });
        if window.count >= tier.max_requests {
            let elapsed = now.duration_since(window.started);
            let retry_after_secs = window.length.saturating_sub(elapsed).as_secs().max(1);
            return RateDecision::Limited { retry_after_secs };
        }

        window.count += 1;
        RateDecision::Allowed { remaining: tier.max_requests - window.count }
    }
}

/// First `X-Forwarded-For` hop when the proxy is trusted, else the socket peer, else `unknown`
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .filter(|_| trust_forwarded_for)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

pub fn request_ip(request: &Request, trust_forwarded_for: bool) -> String {
    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
    client_ip(request.headers(), peer, trust_forwarded_for)
}

async fn enforce(state: &AppState, tier_name: &str, tier: &RateLimitTier, ip: String) -> Result<(), ApiError> {
    let key = format!("{}:{}", tier_name, ip);
    match state.rate_limiter.hit(&key, tier, Instant::now()).await {
        RateDecision::Allowed { .. } => Ok(()),
        RateDecision::Limited { retry_after_secs } => {
            tracing::warn!(ip = %ip, tier = tier_name, "Rate limit exceeded");
            Err(ApiError::too_many_requests(
                "Too many requests, please try again later",
                retry_after_secs,
            ))
        }
    }
}

/// Generic tier, applied to every `/api` route
pub async fn rate_limit_generic(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    if state.config.api.enable_rate_limiting {
        let ip = request_ip(&request, state.config.api.trust_forwarded_for);
        enforce(&state, "generic", &state.config.api.generic_limit, ip).await?;
    }
    Ok(next.run(request).await)
}

/// Strict tier for login and public submissions
pub async fn rate_limit_strict(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    if state.config.api.enable_rate_limiting {
        let ip = request_ip(&request, state.config.api.trust_forwarded_for);
        enforce(&state, "strict", &state.config.api.strict_limit, ip).await?;
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn tier(max_requests: u32) -> RateLimitTier {
        RateLimitTier { max_requests, window_secs: 60 }
    }

    #[tokio::test]
    async fn limits_within_window_and_resets_after() {
        let store = MemoryRateLimitStore::new();
        let start = Instant::now();
        let tier = tier(2);

        assert_eq!(store.hit("ip", &tier, start).await, RateDecision::Allowed { remaining: 1 });
        assert_eq!(store.hit("ip", &tier, start).await, RateDecision::Allowed { remaining: 0 });
        assert!(matches!(
            store.hit("ip", &tier, start + Duration::from_secs(10)).await,
            RateDecision::Limited { retry_after_secs: 50 }
        ));
        assert_eq!(store.hit("other", &tier, start).await, RateDecision::Allowed { remaining: 1 });
        assert_eq!(
            store.hit("ip", &tier, start + Duration::from_secs(61)).await,
            RateDecision::Allowed { remaining: 1 }
        );
    }

    #[tokio::test]
    async fn generic_hits_do_not_expire_strict_windows() {
        let store = MemoryRateLimitStore::new();
        let start = Instant::now();
        let strict = RateLimitTier { max_requests: 2, window_secs: 900 };
        let generic = RateLimitTier { max_requests: 100, window_secs: 60 };

        assert!(matches!(store.hit("strict:ip", &strict, start).await, RateDecision::Allowed { .. }));
        assert!(matches!(store.hit("strict:ip", &strict, start).await, RateDecision::Allowed { .. }));

        let later = start + Duration::from_secs(61);
        assert!(matches!(store.hit("generic:ip", &generic, later).await, RateDecision::Allowed { .. }));
        assert_eq!(
            store.hit("strict:ip", &strict, later).await,
            RateDecision::Limited { retry_after_secs: 839 }
        );
        assert_eq!(
            store.hit("strict:ip", &strict, start + Duration::from_secs(901)).await,
            RateDecision::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop_when_trusted() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:4000".parse().unwrap();
        assert_eq!(client_ip(&headers, None, true), "unknown");
        assert_eq!(client_ip(&headers, Some(peer), true), "10.0.0.9");
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
    }

    #[test]
    fn untrusted_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let peer: SocketAddr = "10.0.0.9:4000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(client_ip(&headers, None, false), "unknown");
    }
}
