use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use nonzero_ext::nonzero;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::error::ApiError;

use super::client_ip;

/// Bucket shared by requests whose address cannot be determined.
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Token bucket per client IP.
///
/// Each client may burst up to `burst_size` requests, refilled at
/// `requests_per_second`.
pub struct RequestLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
    enabled: bool,
}

impl std::fmt::Debug for RequestLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLimiter")
            .field("enabled", &self.enabled)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

impl RequestLimiter {
    pub fn new(cfg: &RateLimitConfig) -> Self {
        let per_second = NonZeroU32::new(cfg.requests_per_second).unwrap_or(nonzero!(1u32));
        let burst = NonZeroU32::new(cfg.burst_size).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            enabled: cfg.enabled,
        }
    }

    /// Take one token for `client`, or report how long until one is free.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        if !self.enabled {
            return Ok(());
        }
        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Forget clients whose buckets are full again.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

/// Middleware to enforce rate limits
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RequestLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_ip(req.headers(), req.extensions()).unwrap_or(UNKNOWN_CLIENT);
    match limiter.check(client) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            warn!(
                name: "rate_limit.rejected",
                client = %client,
                retry_after_ms = retry_after.as_millis(),
                "Rate limit exceeded"
            );
            ApiError::RateLimited { retry_after }.into_response()
        }
    }
}
