//! Process-lifetime redeem counters. Reset only by restart.

use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

pub struct Stats {
    inner: Mutex<Inner>,
    started: Instant,
}

#[derive(Default)]
struct Inner {
    success: u64,
    failed: u64,
    total_baht: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub success: u64,
    pub failed: u64,
    pub total_baht: f64,
    pub uptime_secs: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            started: Instant::now(),
        }
    }

    pub fn record_success(&self, amount: f64) {
        let mut inner = self.inner.lock();
        inner.success += 1;
        inner.total_baht += amount;
    }

    pub fn record_failure(&self) {
        self.inner.lock().failed += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            success: inner.success,
            failed: inner.failed,
            total_baht: inner.total_baht,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    /// Percentage of attempts that succeeded, 0.0 when nothing was tried.
    pub fn success_rate(&self) -> f64 {
        let attempts = self.success + self.failed;
        if attempts == 0 {
            return 0.0;
        }
        self.success as f64 / attempts as f64 * 100.0
    }
}
