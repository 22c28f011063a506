//! ISR-visible channel state.
//!
//! The zero-cross ISR and the cooperative loop communicate through exactly
//! three scalars per channel (`enable`, `output`, `sample_scheduled`) plus
//! the sample timestamp. All of them live here behind atomics, so neither
//! side ever takes a lock:
//!
//! ```text
//!  ISR (zero-cross)                 loop (cooperative)
//!  ────────────────                 ──────────────────
//!  schedule_sample()  ──writes──▶   sample_scheduled, scheduled_at_us
//!  update_output()    ──reads───▶   enable, output, sample_scheduled
//!                     ◀──writes──   set_enabled, set_output,
//!                                   clear_sample_scheduled
//! ```
//!
//! The heater pin handle also lives here because both contexts drive it:
//! the ISR for burst firing and the sample window, the loop for forcing the
//! output LOW on disable and runaway.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::app::ports::DigitalOutput;

/// The ISR-shared half of a channel.
pub struct ChannelShared {
    heater: Box<dyn DigitalOutput>,
    enabled: AtomicBool,
    /// PID output in [0, 1], bit-cast so a plain `AtomicU32` carries it.
    output_bits: AtomicU32,
    sample_scheduled: AtomicBool,
    sample_scheduled_at_us: AtomicU64,
}

impl ChannelShared {
    pub fn new(heater: Box<dyn DigitalOutput>) -> Self {
        Self {
            heater,
            enabled: AtomicBool::new(false),
            output_bits: AtomicU32::new(0.0f32.to_bits()),
            sample_scheduled: AtomicBool::new(false),
            sample_scheduled_at_us: AtomicU64::new(0),
        }
    }

    // ── ISR side ──────────────────────────────────────────────

    /// Open the sample window: force the heater LOW and stamp the request.
    ///
    /// The timestamp is published before the flag so the loop never observes
    /// a scheduled sample with a stale timestamp.
    pub fn schedule_sample(&self, now_us: u64) {
        self.heater.set(false);
        self.sample_scheduled_at_us.store(now_us, Ordering::Release);
        self.sample_scheduled.store(true, Ordering::Release);
    }

    /// Burst-firing decision for one half-cycle.
    ///
    /// The heater is driven HIGH iff the channel is enabled, no sample
    /// window is open, and `op_level` falls below the PID output.
    pub fn update_output(&self, op_level: f32) {
        let on = self.enabled.load(Ordering::Acquire)
            && !self.sample_scheduled.load(Ordering::Acquire)
            && op_level < self.output();
        self.heater.set(on);
    }

    // ── Loop side ─────────────────────────────────────────────

    /// Drive the heater LOW immediately (disable, runaway, init).
    pub fn force_low(&self) {
        self.heater.set(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn output(&self) -> f32 {
        f32::from_bits(self.output_bits.load(Ordering::Acquire))
    }

    pub fn set_output(&self, output: f32) {
        self.output_bits.store(output.to_bits(), Ordering::Release);
    }

    pub fn sample_scheduled(&self) -> bool {
        self.sample_scheduled.load(Ordering::Acquire)
    }

    /// Close the sample window; the next zero-cross resumes firing.
    pub fn clear_sample_scheduled(&self) {
        self.sample_scheduled.store(false, Ordering::Release);
    }

    pub fn scheduled_at_us(&self) -> u64 {
        self.sample_scheduled_at_us.load(Ordering::Acquire)
    }
}
