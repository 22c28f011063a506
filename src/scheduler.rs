//! Zero-cross burst-firing scheduler.
//!
//! Runs entirely in interrupt context, once per mains half-cycle:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ zero-cross ISR (every half-cycle, ~10 ms @ 50 Hz)          │
//! │                                                            │
//! │   assert heartbeat flag                                    │
//! │                                                            │
//! │   k ≥ N ?  ──yes──▶  schedule_sample() on every channel    │
//! │     │                (heater LOW, window opens), k = 0     │
//! │     no                                                     │
//! │     ▼                                                      │
//! │   update_output(k / N) on every channel, k += 1            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Over one window of N half-cycles each channel gets N-1 firing
//! opportunities at a resolution of 1/N full power, and exactly one
//! sample acquisition slot. The per-tick work is a handful of atomic
//! reads and one GPIO write per channel; nothing blocks or allocates.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::channel::ChannelShared;

/// The ISR half of the station: channel handles and the tick counter.
pub struct ZeroCrossScheduler {
    channels: Vec<Arc<ChannelShared>>,
    heartbeat_flag: Arc<AtomicBool>,
    /// Half-cycles per window (N).
    period: u32,
    counter: AtomicU32,
}

impl ZeroCrossScheduler {
    pub fn new(
        channels: Vec<Arc<ChannelShared>>,
        heartbeat_flag: Arc<AtomicBool>,
        period: u32,
    ) -> Self {
        Self {
            channels,
            heartbeat_flag,
            period,
            counter: AtomicU32::new(0),
        }
    }

    /// One zero-crossing tick. Safe to call from interrupt context.
    pub fn on_zero_cross(&self, now_us: u64) {
        self.heartbeat_flag.store(true, Ordering::Release);

        let k = self.counter.load(Ordering::Relaxed);

        if k >= self.period {
            // Sample slot: force every heater LOW and open the windows.
            // No output update on this tick.
            for channel in &self.channels {
                channel.schedule_sample(now_us);
            }
            self.counter.store(0, Ordering::Relaxed);
            return;
        }

        let op_level = k as f32 / self.period as f32;
        for channel in &self.channels {
            channel.update_output(op_level);
        }
        self.counter.store(k + 1, Ordering::Relaxed);
    }
}
