//! Monotonic time adapter.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` (microsecond
//!   precision, monotonic, safe to read from ISRs).
//! - **host** — `std::time::Instant`, for simulation and tests.

use crate::app::ports::Clock;

/// Monotonic clock for the station.
pub struct TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl Default for TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn micros(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a monotonic counter read.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    fn micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
