/// Consecutive-failure circuit breaker.
///
/// Any success resets the count. The breaker trips once the number of
/// consecutive failures exceeds the threshold.
#[derive(Debug, Clone)]
pub struct FailureBreaker {
    threshold: u32,
    consecutive: u32,
}

impl FailureBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
        }
    }

    /// Record a failure. Returns true if the breaker is now tripped.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.is_tripped()
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn is_tripped(&self) -> bool {
        self.consecutive > self.threshold
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
