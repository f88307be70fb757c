//! Fixed-window request limits keyed by client address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::RwLock;
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::error::ApiError;

/// Windows are pruned once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    name: &'static str,
    limit: u32,
    window: Duration,
    enabled: bool,
    windows: RwLock<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, limit: u32, window: Duration, enabled: bool) -> Self {
        Self {
            name,
            limit,
            window,
            enabled,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Counts one request for `key`. Over the limit, returns the seconds
    /// until the window resets.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        if !self.enabled {
            return Ok(());
        }
        let now = Instant::now();
        let mut windows = self.windows.write();
        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let state = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(state.started) >= self.window {
            state.started = now;
            state.count = 0;
        }
        if state.count >= self.limit {
            let remaining = self.window.saturating_sub(now.duration_since(state.started));
            return Err(remaining.as_secs().max(1));
        }
        state.count += 1;
        Ok(())
    }

    /// Gives back one request counted by [`check`](Self::check).
    pub fn refund(&self, key: &str) {
        if let Some(state) = self.windows.write().get_mut(key) {
            state.count = state.count.saturating_sub(1);
        }
    }
}

/// One limiter per route class.
pub struct RateLimiters {
    pub auth: Arc<RateLimiter>,
    pub upload: Arc<RateLimiter>,
    pub api: Arc<RateLimiter>,
    pub public: Arc<RateLimiter>,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        let make = |name, limit| Arc::new(RateLimiter::new(name, limit, config.window, config.enabled));
        Self {
            auth: make("auth", config.auth),
            upload: make("upload", config.upload),
            api: make("api", config.api),
            public: make("public", config.public),
        }
    }
}

/// Middleware state: the limiter for a group of routes.
#[derive(Clone)]
pub struct Limit {
    limiter: Arc<RateLimiter>,
    /// Successful responses do not count against the limit.
    skip_successful: bool,
}

impl Limit {
    pub fn counting_all(limiter: &Arc<RateLimiter>) -> Self {
        Self {
            limiter: Arc::clone(limiter),
            skip_successful: false,
        }
    }

    pub fn counting_failures(limiter: &Arc<RateLimiter>) -> Self {
        Self {
            limiter: Arc::clone(limiter),
            skip_successful: true,
        }
    }
}

/// First `X-Forwarded-For` entry, else the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn enforce(State(limit): State<Limit>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    if let Err(retry_after) = limit.limiter.check(&key) {
        warn!(limiter = limit.limiter.name, client = %key, "rate limit exceeded");
        return ApiError::rate_limited(retry_after).into_response();
    }

    let response = next.run(req).await;
    if limit.skip_successful && response.status().is_success() {
        limit.limiter.refund(&key);
    }
    response
}
