//! Per-client fixed-window rate limiting kept in process memory.
//!
//! Counters live in a `DashMap`; the entry lock makes increment-and-check atomic
//! per client without blocking other clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::settings::RateLimitSettings;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Bounds requests per client address within a fixed time window.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
    trust_forwarded_headers: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
            trust_forwarded_headers: false,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self {
            trust_forwarded_headers: settings.trust_forwarded_headers,
            ..Self::new(settings.max_requests, Duration::from_secs(settings.window_secs))
        }
    }

    /// Count a request from `client`.
    ///
    /// Returns Ok(()) if allowed, Err with retry-after seconds if limited.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), u64> {
        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(Window {
                started: now,
                count: 0,
            });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);

        if entry.count > self.max_requests {
            let remaining = self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started));
            let retry_after = remaining.as_secs_f64().ceil().max(1.0) as u64;
            debug!(
                client = client,
                count = entry.count,
                limit = self.max_requests,
                "rate limit exceeded"
            );
            Err(retry_after)
        } else {
            Ok(())
        }
    }

    /// Drop windows that have already elapsed. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    fn evict_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Periodically evict elapsed windows so idle clients do not accumulate.
    pub fn spawn_cleanup(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = self.evict_expired();
                if removed > 0 {
                    debug!(
                        "Evicted {} expired rate limit windows ({} still tracked)",
                        removed,
                        self.tracked_clients()
                    );
                }
            }
        })
    }
}

/// Get the client identifier (IP address) for rate limiting.
///
/// Forwarding headers are client-controlled, so they are only consulted when
/// `trust_forwarded` is set; otherwise the socket peer is the identity.
pub fn get_client_id(
    addr: Option<SocketAddr>,
    headers: &HeaderMap,
    trust_forwarded: bool,
) -> String {
    if trust_forwarded {
        if let Some(ip) = forwarded_client(headers) {
            return ip;
        }
    }

    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next());
    let real_ip = headers.get("x-real-ip").and_then(|v| v.to_str().ok());

    [forwarded_for, real_ip]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Middleware rejecting over-limit clients with 429 before any validation runs.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = get_client_id(
        addr,
        request.headers(),
        state.rate_limiter.trust_forwarded_headers,
    );

    match state.rate_limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(retry_after_secs) => {
            warn!(
                client = %client,
                path = %request.uri().path(),
                retry_after = retry_after_secs,
                "rejecting rate limited request"
            );
            ApiError::RateLimited { retry_after_secs }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_eleventh_request_is_limited() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..10 {
            assert!(limiter.check_at("1.2.3.4", now).is_ok());
        }
        let retry_after = limiter.check_at("1.2.3.4", now).unwrap_err();
        assert_eq!(retry_after, 60);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
        assert!(limiter.check_at("b", now).is_ok());
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("a", start).is_ok());
        assert!(limiter.check_at("a", start).is_ok());

        let later = start + Duration::from_secs(45);
        assert_eq!(limiter.check_at("a", later).unwrap_err(), 15);

        let next_window = start + Duration::from_secs(60);
        assert!(limiter.check_at("a", next_window).is_ok());
    }

    #[test]
    fn test_evict_expired() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at("old", start).unwrap();
        limiter.check_at("new", start + Duration::from_secs(30)).unwrap();

        let removed = limiter.evict_expired_at(start + Duration::from_secs(61));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_concurrent_checks_lose_no_updates() {
        let limiter = Arc::new(RateLimiter::new(1000, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        limiter.check("shared").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(limiter.windows.get("shared").unwrap().count, 800);
    }

    #[test]
    fn test_get_client_id_trusted_proxy() {
        let addr: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(get_client_id(Some(addr), &headers, true), "192.168.1.9");
        assert_eq!(get_client_id(None, &headers, true), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(get_client_id(Some(addr), &headers, true), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(get_client_id(Some(addr), &headers, true), "203.0.113.7");
    }

    #[test]
    fn test_get_client_id_ignores_forwarding_headers_by_default() {
        let addr: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(get_client_id(Some(addr), &headers, false), "192.168.1.9");
        assert_eq!(get_client_id(None, &headers, false), "unknown");
    }

    #[test]
    fn test_from_settings_carries_proxy_trust() {
        let settings = RateLimitSettings {
            trust_forwarded_headers: true,
            ..RateLimitSettings::default()
        };
        assert!(RateLimiter::from_settings(&settings).trust_forwarded_headers);

        let default_limiter = RateLimiter::from_settings(&RateLimitSettings::default());
        assert!(!default_limiter.trust_forwarded_headers);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_evicts_expired_windows() {
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(60)));
        limiter.check("idle").unwrap();
        let handle = limiter.clone().spawn_cleanup(Duration::from_secs(300));

        // First tick is consumed immediately; nothing has expired yet
        tokio::task::yield_now().await;
        assert_eq!(limiter.tracked_clients(), 1);

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::task::yield_now().await;
        assert_eq!(limiter.tracked_clients(), 0);

        handle.abort();
    }
}
