use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    turns: AtomicU64,
    llm_requests: AtomicU64,
    llm_failures: AtomicU64,
    rate_limit_retries: AtomicU64,
    tool_executions: AtomicU64,
    tool_failures: AtomicU64,
    permission_denials: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_turns(&self) {
        self.turns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_requests(&self) {
        self.llm_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_llm_failures(&self) {
        self.llm_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rate_limit_retries(&self) {
        self.rate_limit_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_executions(&self) {
        self.tool_executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_failures(&self) {
        self.tool_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_permission_denials(&self) {
        self.permission_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            turns: self.turns.load(Ordering::Relaxed),
            llm_requests: self.llm_requests.load(Ordering::Relaxed),
            llm_failures: self.llm_failures.load(Ordering::Relaxed),
            rate_limit_retries: self.rate_limit_retries.load(Ordering::Relaxed),
            tool_executions: self.tool_executions.load(Ordering::Relaxed),
            tool_failures: self.tool_failures.load(Ordering::Relaxed),
            permission_denials: self.permission_denials.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub turns: u64,
    pub llm_requests: u64,
    pub llm_failures: u64,
    pub rate_limit_retries: u64,
    pub tool_executions: u64,
    pub tool_failures: u64,
    pub permission_denials: u64,
}

impl MetricsSnapshot {
    pub fn llm_success_rate(&self) -> f64 {
        if self.llm_requests == 0 {
            return 1.0;
        }
        1.0 - (self.llm_failures as f64 / self.llm_requests as f64)
    }

    pub fn tool_success_rate(&self) -> f64 {
        if self.tool_executions == 0 {
            return 1.0;
        }
        1.0 - (self.tool_failures as f64 / self.tool_executions as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rates() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().tool_success_rate(), 1.0);

        for _ in 0..4 {
            metrics.inc_tool_executions();
        }
        metrics.inc_tool_failures();
        metrics.inc_llm_requests();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tool_success_rate(), 0.75);
        assert_eq!(snapshot.llm_success_rate(), 1.0);
    }
}
