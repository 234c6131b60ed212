use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::source_policy::SourcePolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-source request gate. Connectors wait on it before each outbound call so
/// bursts of country lookups stay inside the upstream's published quota.
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<DirectRateLimiter>,
    quota_limit: u32,
}

impl RateGate {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let safe_limit = quota_limit.max(1);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(
                quota_window,
                safe_limit,
            ))),
            quota_limit: safe_limit,
        }
    }

    pub fn from_policy(policy: &SourcePolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Non-blocking check; `true` consumes one unit of budget.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits until one unit of budget is available.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub fn quota_limit(&self) -> u32 {
        self.quota_limit
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
