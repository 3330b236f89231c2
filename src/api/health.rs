//! Shared health state for the /health endpoint.
//! Updated by the scanner after every scan, read by the API.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use crate::fetcher::Quota;

/// Shared scan counters. Quota values of -1 mean the provider has not reported them.
pub struct HealthState {
    pub scans_completed: AtomicU64,
    pub scans_failed: AtomicU64,
    /// Millisecond timestamp of the last successful scan (0 = none).
    pub last_scan_at_ms: AtomicI64,
    pub events_analyzed: AtomicU64,
    pub arbitrage_found: AtomicU64,
    pub quota_remaining: AtomicI64,
    pub quota_used: AtomicI64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scan(&self, at_ms: i64, events: usize, arbitrage: usize) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        self.last_scan_at_ms.store(at_ms, Ordering::Relaxed);
        self.events_analyzed.store(events as u64, Ordering::Relaxed);
        self.arbitrage_found.store(arbitrage as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Only overwrite what the provider actually reported.
    pub fn set_quota(&self, quota: Quota) {
        if let Some(remaining) = quota.remaining {
            self.quota_remaining.store(remaining as i64, Ordering::Relaxed);
        }
        if let Some(used) = quota.used {
            self.quota_used.store(used as i64, Ordering::Relaxed);
        }
    }

    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    pub fn scans_failed(&self) -> u64 {
        self.scans_failed.load(Ordering::Relaxed)
    }

    pub fn last_scan_at_ms(&self) -> Option<i64> {
        Some(self.last_scan_at_ms.load(Ordering::Relaxed)).filter(|&ms| ms > 0)
    }

    pub fn events_analyzed(&self) -> u64 {
        self.events_analyzed.load(Ordering::Relaxed)
    }

    pub fn arbitrage_found(&self) -> u64 {
        self.arbitrage_found.load(Ordering::Relaxed)
    }

    pub fn quota(&self) -> Quota {
        let read = |v: &AtomicI64| u64::try_from(v.load(Ordering::Relaxed)).ok();
        Quota {
            remaining: read(&self.quota_remaining),
            used: read(&self.quota_used),
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            scans_completed: AtomicU64::new(0),
            scans_failed: AtomicU64::new(0),
            last_scan_at_ms: AtomicI64::new(0),
            events_analyzed: AtomicU64::new(0),
            arbitrage_found: AtomicU64::new(0),
            quota_remaining: AtomicI64::new(-1),
            quota_used: AtomicI64::new(-1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_unknown_until_reported() {
        let health = HealthState::new();
        assert_eq!(health.quota(), Quota::default());
        assert_eq!(health.last_scan_at_ms(), None);

        health.set_quota(Quota { remaining: Some(480), used: None });
        health.set_quota(Quota { remaining: None, used: Some(20) });
        assert_eq!(health.quota(), Quota { remaining: Some(480), used: Some(20) });
    }

    #[test]
    fn scans_are_counted() {
        let health = HealthState::new();
        health.record_scan(1_700_000_000_000, 42, 3);
        health.record_failure();
        health.record_scan(1_700_000_060_000, 40, 1);

        assert_eq!(health.scans_completed(), 2);
        assert_eq!(health.scans_failed(), 1);
        assert_eq!(health.last_scan_at_ms(), Some(1_700_000_060_000));
        assert_eq!(health.events_analyzed(), 40);
        assert_eq!(health.arbitrage_found(), 1);
    }
}
