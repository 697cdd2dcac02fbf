// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Custom middleware

use crate::config::RateLimitConfig;
use crate::error::ServerError;
use axum::{extract::Request, middleware::Next, response::Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(60);

/// Sliding one-minute request counts per client
#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    config: RateLimitConfig,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Record a request from `key`; false when the client is over its limit
    pub async fn check_rate_limit(&self, key: &str) -> bool {
        self.check_rate_limit_at(key, Instant::now()).await
    }

    async fn check_rate_limit_at(&self, key: &str, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut requests = self.requests.lock().await;

        // Forget clients whose window has emptied
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < WINDOW);
            !times.is_empty()
        });

        let limit = usize::try_from(self.config.requests_per_minute).unwrap_or(usize::MAX);
        if limit == 0 {
            return false;
        }

        let client_requests = requests.entry(key.to_string()).or_default();
        if client_requests.len() < limit {
            client_requests.push(now);
            true
        } else {
            false
        }
    }
}

/// Client identity used for rate limiting
///
/// The first `x-forwarded-for` entry when present.
fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    state: Arc<RateLimitState>,
    req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let client = client_key(&req);
    if state.check_rate_limit(&client).await {
        Ok(next.run(req).await)
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        Err(ServerError::RateLimited)
    }
}
