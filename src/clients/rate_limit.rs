//! Client-side spacing of REST calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::clients::ApiCallLimit;

/// Spaces consecutive calls at least one `cycle` apart.
///
/// Shopify's REST bucket leaks two requests per second, so a cycle of
/// 500 ms keeps a single client from ever being throttled. When the last
/// response reported a full bucket, the next call waits an extra cycle.
///
/// The limiter belongs to one [`ShopifyApi`](crate::clients::ShopifyApi) and
/// therefore to one tenant; clients for different shops never wait on each
/// other.
#[derive(Debug)]
pub struct RateLimiter {
    cycle: Duration,
    state: Mutex<LimiterState>,
}

#[derive(Debug, Default)]
struct LimiterState {
    last_call: Option<Instant>,
    bucket_full: bool,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing.
    #[must_use]
    pub fn new(cycle: Duration) -> Self {
        Self {
            cycle,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// Returns the minimum spacing between calls.
    #[must_use]
    pub const fn cycle(&self) -> Duration {
        self.cycle
    }

    /// Waits until the next call may be sent, then records it.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self) -> Duration {
        let mut state = self.state.lock().await;

        let mut spacing = self.cycle;
        if state.bucket_full {
            spacing += self.cycle;
        }

        let wait = state
            .last_call
            .map_or(Duration::ZERO, |last| spacing.saturating_sub(last.elapsed()));

        if !wait.is_zero() {
            tracing::debug!("Rate limiting: waiting {:?} before next call", wait);
            tokio::time::sleep(wait).await;
        }

        state.last_call = Some(Instant::now());
        state.bucket_full = false;
        wait
    }

    /// Records the bucket state reported by the latest response.
    pub async fn observe(&self, limit: Option<ApiCallLimit>) {
        if let Some(limit) = limit {
            self.state.lock().await.bucket_full = limit.is_exhausted();
        }
    }
}
