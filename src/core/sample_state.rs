//! Rate computation from consecutive cumulative readings

use netmon_types::{InterfaceCounters, SpeedSample};
use std::time::Instant;

/// Baseline kept between ticks
///
/// Owned by a single sampler. The first reading only establishes the
/// baseline; every later reading with a positive elapsed time yields a
/// sample and becomes the new baseline.
#[derive(Debug, Clone)]
pub struct SampleState {
    last_bytes_received: u64,
    last_bytes_sent: u64,
    last_timestamp: Instant,
    is_first_reading: bool,
}

impl SampleState {
    pub fn new() -> Self {
        Self {
            last_bytes_received: 0,
            last_bytes_sent: 0,
            last_timestamp: Instant::now(),
            is_first_reading: true,
        }
    }

    pub fn is_first_reading(&self) -> bool {
        self.is_first_reading
    }

    /// Current baseline, or None before the first reading
    pub fn baseline(&self) -> Option<(InterfaceCounters, Instant)> {
        if self.is_first_reading {
            return None;
        }
        let counters = InterfaceCounters {
            bytes_received: self.last_bytes_received,
            bytes_sent: self.last_bytes_sent,
        };
        Some((counters, self.last_timestamp))
    }

    /// Feed one reading taken at `now`.
    ///
    /// Returns a sample for every reading except the first. A reading whose
    /// timestamp is not after the baseline is dropped without touching the
    /// baseline.
    pub fn advance(&mut self, counters: InterfaceCounters, now: Instant) -> Option<SpeedSample> {
        if self.is_first_reading {
            self.is_first_reading = false;
            self.store(counters, now);
            return None;
        }

        let elapsed = match now.checked_duration_since(self.last_timestamp) {
            Some(elapsed) if !elapsed.is_zero() => elapsed.as_secs_f64(),
            _ => return None,
        };

        let sample = SpeedSample {
            download_bytes_per_sec: rate(counters.bytes_received, self.last_bytes_received, elapsed),
            upload_bytes_per_sec: rate(counters.bytes_sent, self.last_bytes_sent, elapsed),
        };

        self.store(counters, now);
        Some(sample)
    }

    fn store(&mut self, counters: InterfaceCounters, now: Instant) {
        self.last_bytes_received = counters.bytes_received;
        self.last_bytes_sent = counters.bytes_sent;
        self.last_timestamp = now;
    }
}

impl Default for SampleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes per second between two cumulative readings, zero if the counter went backwards
fn rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    if current < previous {
        return 0.0;
    }
    ((current - previous) as f64 / elapsed_secs).max(0.0)
}
