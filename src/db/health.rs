use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: u64,
}

impl HealthCheckResult {
    pub fn healthy(latency: Duration) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
            timestamp_ms: now_ms(),
        }
    }

    pub fn unhealthy(error: String) -> Self {
        Self {
            healthy: false,
            latency_ms: None,
            error: Some(error),
            timestamp_ms: now_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: Option<u64>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Default)]
pub struct HealthTracker {
    consecutive_failures: u32,
    last_result: Option<HealthCheckResult>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, result: HealthCheckResult) {
        if result.healthy {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        self.last_result = Some(result);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            healthy: self
                .last_result
                .as_ref()
                .map(|r| r.healthy)
                .unwrap_or(false),
            latency_ms: self.last_result.as_ref().and_then(|r| r.latency_ms),
            error: self.last_result.as_ref().and_then(|r| r.error.clone()),
            timestamp_ms: self.last_result.as_ref().map(|r| r.timestamp_ms),
            consecutive_failures: self.consecutive_failures,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts_consecutive_failures_and_resets() {
        let mut tracker = HealthTracker::new();
        assert!(!tracker.snapshot().healthy);

        tracker.process(HealthCheckResult::unhealthy("down".to_string()));
        tracker.process(HealthCheckResult::unhealthy("down".to_string()));
        let snapshot = tracker.snapshot();
        assert!(!snapshot.healthy);
        assert_eq!(snapshot.consecutive_failures, 2);

        tracker.process(HealthCheckResult::healthy(Duration::from_millis(3)));
        let snapshot = tracker.snapshot();
        assert!(snapshot.healthy);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.latency_ms, Some(3));
    }
}
