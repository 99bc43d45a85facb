//! Per-process relay counters.

use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

pub struct RelayStats {
    inner: Mutex<Inner>,
    started: Instant,
}

#[derive(Default)]
struct Inner {
    total: u64,
    success: u64,
    failed: u64,
    cloudflare: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelaySnapshot {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub cloudflare: u64,
    pub uptime_secs: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            started: Instant::now(),
        }
    }

    pub fn record_request(&self) {
        self.inner.lock().total += 1;
    }

    pub fn record_success(&self) {
        self.inner.lock().success += 1;
    }

    pub fn record_failure(&self) {
        self.inner.lock().failed += 1;
    }

    pub fn record_cloudflare(&self) {
        self.inner.lock().cloudflare += 1;
    }

    pub fn snapshot(&self) -> RelaySnapshot {
        let inner = self.inner.lock();
        RelaySnapshot {
            total: inner.total,
            success: inner.success,
            failed: inner.failed,
            cloudflare: inner.cloudflare,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}
