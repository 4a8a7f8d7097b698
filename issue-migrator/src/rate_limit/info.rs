//! Rate limit information carried by target API responses.

use crate::target::ApiResponse;
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// Quota state reported by the `X-RateLimit-*` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Unix timestamp when the rate limit resets.
    pub reset: u64,

    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Parses quota headers, returning `None` unless both remaining and reset are present.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_u64(headers, "x-ratelimit-remaining")?;
        let reset = header_u64(headers, "x-ratelimit-reset")?;
        let limit = header_u64(headers, "x-ratelimit-limit").unwrap_or_default();

        Some(Self {
            remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
            reset,
            limit: u32::try_from(limit).unwrap_or(u32::MAX),
        })
    }
}

/// How the server asked us to back off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitSignal {
    /// Explicit `Retry-After` directive.
    RetryAfter(Duration),

    /// Quota exhausted; retry once the window resets (Unix timestamp).
    UntilReset(u64),

    /// Throttled without any duration hint (secondary/abuse limit).
    Unspecified,
}

impl RateLimitSignal {
    /// Classifies a response, returning `None` when it is not a rate-limit rejection.
    #[must_use]
    pub fn detect(response: &ApiResponse) -> Option<Self> {
        let status = response.status;
        if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
            return None;
        }

        if let Some(secs) = header_u64(&response.headers, "retry-after") {
            return Some(Self::RetryAfter(Duration::from_secs(secs)));
        }

        if let Some(info) = RateLimitInfo::from_headers(&response.headers) {
            if info.remaining == 0 {
                return Some(Self::UntilReset(info.reset));
            }
        }

        let body = response.body.to_lowercase();
        if status == StatusCode::TOO_MANY_REQUESTS
            || body.contains("rate limit")
            || body.contains("abuse")
        {
            return Some(Self::Unspecified);
        }

        None
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
