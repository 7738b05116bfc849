//! Client-side request throttling keyed by endpoint.
//!
//! Every endpoint gets its own token bucket, created on first use. Buckets are
//! advisory: they keep a well-behaved client under the published limits, while
//! exchange-side rejections still come back through the response wrapper.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// 30 requests per minute with a burst of one
pub fn default_quota() -> Quota {
    Quota::per_minute(nonzero!(30u32)).allow_burst(nonzero!(1u32))
}

/// Limiter key for an endpoint, e.g. `GET /v5/market/time`
pub fn endpoint_key(method: &Method, path: &str) -> String {
    format!("{} {}", method.as_str(), path)
}

/// Per-endpoint token buckets sharing one default quota
pub struct EndpointRateLimiter {
    default_quota: Quota,
    overrides: HashMap<String, Quota>,
    limiters: RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>,
}

impl std::fmt::Debug for EndpointRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointRateLimiter")
            .field("default_quota", &self.default_quota)
            .field("overrides", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

impl Default for EndpointRateLimiter {
    fn default() -> Self {
        Self::new(default_quota())
    }
}

impl EndpointRateLimiter {
    pub fn new(default_quota: Quota) -> Self {
        Self {
            default_quota,
            overrides: HashMap::new(),
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Use `quota` instead of the default for one endpoint key
    pub fn with_override(mut self, key: impl Into<String>, quota: Quota) -> Self {
        self.overrides.insert(key.into(), quota);
        self
    }

    pub fn with_overrides<I, K>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, Quota)>,
        K: Into<String>,
    {
        self.overrides
            .extend(overrides.into_iter().map(|(k, q)| (k.into(), q)));
        self
    }

    /// Quota that applies to `key`
    pub fn quota_for(&self, key: &str) -> Quota {
        self.overrides
            .get(key)
            .copied()
            .unwrap_or(self.default_quota)
    }

    fn limiter(&self, key: &str) -> Arc<DefaultDirectRateLimiter> {
        if let Some(limiter) = self
            .limiters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(limiter);
        }

        let mut limiters = self
            .limiters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(limiters.entry(key.to_string()).or_insert_with(|| {
            debug!(endpoint = %key, "creating rate limiter");
            Arc::new(RateLimiter::direct(self.quota_for(key)))
        }))
    }

    /// Wait until the endpoint's bucket yields a token
    pub async fn acquire(&self, key: &str) {
        let limiter = self.limiter(key);
        if limiter.check().is_err() {
            trace!(endpoint = %key, "rate limited, waiting for a token");
            limiter.until_ready().await;
        }
    }

    /// Take a token without waiting. Returns `false` when the bucket is empty.
    pub fn check(&self, key: &str) -> bool {
        self.limiter(key).check().is_ok()
    }
}
