//! In-memory histogram of scan durations (fetch through report write).

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

/// Values stored in milliseconds. Tracks 1ms to 1h, 3 significant figures.
const MAX_SCAN_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
    pub samples: u64,
}

/// Shared scan timing. Scanner records, API reads.
pub struct ScanLatency {
    /// None if the histogram could not be allocated; recording is then a no-op.
    inner: Option<Mutex<Histogram<u64>>>,
}

impl ScanLatency {
    pub fn new() -> Self {
        Self {
            inner: Histogram::new_with_bounds(1, MAX_SCAN_MS, 3).ok().map(Mutex::new),
        }
    }

    /// Durations beyond the tracked range are clamped to it.
    pub fn record(&self, d: Duration) {
        let ms = (d.as_millis().min(u128::from(MAX_SCAN_MS)) as u64).max(1);
        if let Some(Ok(mut h)) = self.inner.as_ref().map(|m| m.lock()) {
            let _ = h.record(ms);
        }
    }

    pub fn percentiles(&self) -> Percentiles {
        let Some(Ok(h)) = self.inner.as_ref().map(|m| m.lock()) else {
            return Percentiles::default();
        };
        if h.len() == 0 {
            return Percentiles::default();
        }
        Percentiles {
            p50_ms: Some(h.value_at_quantile(0.5)),
            p95_ms: Some(h.value_at_quantile(0.95)),
            p99_ms: Some(h.value_at_quantile(0.99)),
            samples: h.len(),
        }
    }
}

impl Default for ScanLatency {
    fn default() -> Self {
        Self::new()
    }
}
