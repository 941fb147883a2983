use std::time::Duration;

/// Pacing between geocode requests: one request in flight, then a fixed
/// pause before the next. Not adaptive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatePolicy {
    delay: Duration,
}

impl RatePolicy {
    pub fn fixed_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits out the configured delay after a record completes.
    pub async fn pace(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
