//! Time utilities for the fixed-step simulation

use std::time::{Duration, Instant};

/// Process start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize process start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get process uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const DEFAULT_SIMULATION_TPS: u32 = 60;
pub const DEFAULT_SNAPSHOT_INTERVAL_TICKS: u32 = 3;

/// Fixed simulation step in seconds.
///
/// Every `advance` and every replayed tick uses this value; the simulation
/// never sees a measured frame time.
pub fn tick_delta(tps: u32) -> f32 {
    1.0 / tps.max(1) as f32
}

/// Wall-clock length of one tick, used only by the schedulers
pub fn tick_duration(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / tps.max(1) as u64)
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_delta_is_reciprocal_of_rate() {
        assert_eq!(tick_delta(60), 1.0 / 60.0);
        assert_eq!(tick_delta(0), 1.0);
    }

    #[test]
    fn tick_duration_matches_rate() {
        assert_eq!(tick_duration(50), Duration::from_millis(20));
    }
}
