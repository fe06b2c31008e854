// Rate limit detection
//
// Primary limit: quota exhausted (`x-ratelimit-remaining: 0`), resets at
// `x-ratelimit-reset`. Secondary limit: abuse detection, reported through the
// error message and usually a `retry-after` header.

use repogate_core::port::ProviderError;
use reqwest::header::HeaderMap;

/// Rate limit headers of a response
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RateLimitSignals {
    pub remaining: Option<u64>,
    /// Epoch seconds
    pub reset_at: Option<i64>,
    pub retry_after: Option<u64>,
}

impl RateLimitSignals {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }

        Self {
            remaining: parse(headers, "x-ratelimit-remaining"),
            reset_at: parse(headers, "x-ratelimit-reset"),
            retry_after: parse(headers, "retry-after"),
        }
    }

    /// Seconds until the quota resets
    fn wait_secs(&self, now: i64) -> u64 {
        if let Some(secs) = self.retry_after {
            return secs;
        }
        self.reset_at
            .map(|reset| (reset - now).max(0) as u64)
            .unwrap_or(0)
    }
}

/// Classify a failed REST response as a rate limit, if it is one
pub fn classify(
    status: u16,
    signals: &RateLimitSignals,
    message: &str,
    now: i64,
) -> Option<ProviderError> {
    if status != 403 && status != 429 {
        return None;
    }

    let lowered = message.to_ascii_lowercase();
    if lowered.contains("secondary rate limit") || lowered.contains("abuse") {
        return Some(ProviderError::SecondaryRateLimited);
    }

    if signals.remaining == Some(0) || (status == 429 && signals.retry_after.is_some()) {
        return Some(ProviderError::RateLimited {
            retry_after_secs: signals.wait_secs(now),
        });
    }

    None
}

/// GraphQL reports an exhausted quota as a 200 response with a `RATE_LIMITED` error
pub fn graphql_rate_limit(
    kind: Option<&str>,
    signals: &RateLimitSignals,
    now: i64,
) -> Option<ProviderError> {
    (kind == Some("RATE_LIMITED")).then(|| ProviderError::RateLimited {
        retry_after_secs: signals.wait_secs(now),
    })
}
