//! In-memory sliding-window rate limiter for the anonymous form endpoints.
//! Per-process only; put a real edge limiter in front for multi-instance
//! deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct RateLimiter {
    hits: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            hits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record a hit for `key` (an IP, usually) and report whether it is
    /// still inside the allowance. Stale entries are pruned on the way in.
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.write().await;

        let history = hits.entry(key.to_string()).or_default();
        history.retain(|&t| now.duration_since(t) < self.window);

        if history.len() < self.max_requests {
            history.push(now);
            true
        } else {
            false
        }
    }
}

/// First hop of `x-forwarded-for`, or "unknown" — the proxy in front of this
/// service sets the header, so direct clients all share one bucket.
pub fn client_ip(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}
