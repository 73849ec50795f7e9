//! Failed-Credential Rate Limiting
//!
//! In-process sliding window over rejected tokens, keyed by client. A client
//! that keeps presenting bad tokens is answered 429 before any verification
//! work is done. Anonymous requests and good tokens never count.

use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::Serialize;

use crate::config::RateLimitSettings;
use crate::shared::error::AppError;

/// Information about rate limit status returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    /// Failures allowed in one window
    pub limit: u32,
    /// Failures left before the client is limited
    pub remaining: u32,
    /// Unix timestamp when the oldest counted failure expires
    pub reset_at: i64,
    /// Seconds until another credential will be checked
    pub retry_after: u64,
}

/// Sliding-window counter of rejected credentials per client identifier.
///
/// A request carrying a credential takes a [`FailureSlot`] before it is
/// verified. The slot counts against the client while verification runs and
/// is given back unless the credential is rejected, so concurrent requests
/// can never verify more than `max_failures` bad tokens per window.
#[derive(Debug)]
pub struct FailureRateLimiter {
    failures: DashMap<String, VecDeque<Instant>>,
    max_failures: u32,
    window: Duration,
    trust_forwarded_headers: bool,
}

impl FailureRateLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            failures: DashMap::new(),
            max_failures,
            window,
            trust_forwarded_headers: false,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_failed_attempts,
            Duration::from_secs(settings.window_seconds),
        )
        .with_forwarded_headers(settings.trust_forwarded_headers)
    }

    /// Key clients on `X-Forwarded-For`/`X-Real-IP` instead of the peer address.
    ///
    /// Only enable behind a reverse proxy that overwrites those headers.
    pub fn with_forwarded_headers(mut self, trusted: bool) -> Self {
        self.trust_forwarded_headers = trusted;
        self
    }

    /// Reserve one failure for `identifier` ahead of verification.
    ///
    /// Returns `Err(RateLimitInfo)` without reserving if the client is limited.
    pub fn acquire(&self, identifier: &str) -> Result<FailureSlot<'_>, RateLimitInfo> {
        self.acquire_at(identifier, Instant::now())
    }

    /// Drop clients whose failures have all left the window.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.failures.retain(|_, hits| {
            prune(hits, now, self.window);
            !hits.is_empty()
        });
    }

    /// Number of clients with failures inside the window.
    pub fn tracked_clients(&self) -> usize {
        self.failures.len()
    }

    /// Rate limit identifier of the client that sent `request`.
    pub fn client_identifier(&self, request: &Request) -> String {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        if self.trust_forwarded_headers {
            if let Some(ip) = forwarded_ip(request.headers()) {
                return format!("ip:{}", ip);
            }
        }

        match client_ip {
            Some(ip) => format!("ip:{}", ip),
            None => {
                tracing::warn!("Could not determine client identifier for rate limiting");
                "ip:unknown".to_string()
            }
        }
    }

    fn acquire_at(&self, identifier: &str, now: Instant) -> Result<FailureSlot<'_>, RateLimitInfo> {
        // Check and reserve under the same entry lock
        let mut hits = self.failures.entry(identifier.to_string()).or_default();
        prune(&mut hits, now, self.window);

        if hits.len() >= self.max_failures as usize {
            return Err(self.info(&hits, now));
        }
        hits.push_back(now);

        Ok(FailureSlot {
            limiter: self,
            identifier: identifier.to_string(),
            reserved_at: now,
            committed: false,
        })
    }

    fn release(&self, identifier: &str, reserved_at: Instant) {
        if let Some(mut hits) = self.failures.get_mut(identifier) {
            if let Some(pos) = hits.iter().rposition(|hit| *hit == reserved_at) {
                hits.remove(pos);
            }
        }
        self.failures.remove_if(identifier, |_, hits| hits.is_empty());
    }

    fn status(&self, identifier: &str, now: Instant) -> RateLimitInfo {
        match self.failures.get_mut(identifier) {
            Some(mut hits) => {
                prune(&mut hits, now, self.window);
                self.info(&hits, now)
            }
            None => self.info(&VecDeque::new(), now),
        }
    }

    fn info(&self, hits: &VecDeque<Instant>, now: Instant) -> RateLimitInfo {
        let count = u32::try_from(hits.len()).unwrap_or(u32::MAX);
        let until_reset = hits
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(self.window);
        let retry_after = until_reset.as_secs() + u64::from(until_reset.subsec_nanos() > 0);

        RateLimitInfo {
            limit: self.max_failures,
            remaining: self.max_failures.saturating_sub(count),
            reset_at: chrono::Utc::now().timestamp() + retry_after as i64,
            retry_after,
        }
    }
}

/// A failure reserved for one in-flight credential.
///
/// Dropping the slot gives the reservation back; [`FailureSlot::commit`]
/// keeps it as a counted failure.
#[derive(Debug)]
pub struct FailureSlot<'a> {
    limiter: &'a FailureRateLimiter,
    identifier: String,
    reserved_at: Instant,
    committed: bool,
}

impl FailureSlot<'_> {
    /// Count the reservation as a rejected credential.
    pub fn commit(mut self) -> RateLimitInfo {
        self.committed = true;
        self.limiter.status(&self.identifier, Instant::now())
    }
}

impl Drop for FailureSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.limiter.release(&self.identifier, self.reserved_at);
        }
    }
}

fn prune(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = hits.front() {
        if now.saturating_duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

/// Client address as reported by a reverse proxy.
///
/// `X-Forwarded-For` first hop, then `X-Real-IP`. Values that are not IP
/// addresses are ignored.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded_for.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
    })
}

/// Add rate limit headers to a response.
pub fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(info.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(info.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(info.reset_at));
}

/// Create a 429 Too Many Requests response.
pub fn create_rate_limit_response(info: &RateLimitInfo) -> Response {
    let mut response = AppError::RateLimited {
        retry_after: info.retry_after,
    }
    .into_response();

    let limited = RateLimitInfo {
        remaining: 0,
        ..info.clone()
    };
    add_rate_limit_headers(response.headers_mut(), &limited);

    response
}
