//! Liveness heartbeat.
//!
//! The zero-cross ISR asserts a flag on every tick; the cooperative loop
//! shapes that flag into a pulse on an external pin, HIGH on every assert
//! and LOW once the pulse width has elapsed. If either context stalls the
//! pulse train stops and a supervising circuit can observe the lock-up:
//! a dead ISR leaves the pin LOW, a dead loop leaves it frozen.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::ports::DigitalOutput;

/// Heartbeat pulse shaper.
pub struct Heartbeat {
    pin: Box<dyn DigitalOutput>,
    flag: Arc<AtomicBool>,
    pulse_width_us: u64,
    output_high: bool,
    rise_at_us: u64,
}

impl Heartbeat {
    pub fn new(pin: Box<dyn DigitalOutput>, pulse_width_us: u64) -> Self {
        Self {
            pin,
            flag: Arc::new(AtomicBool::new(false)),
            pulse_width_us,
            output_high: false,
            rise_at_us: 0,
        }
    }

    /// The flag handle the ISR asserts. Seeded high so the very first
    /// service pass emits a pulse even before the first zero-crossing.
    pub fn flag_handle(&self) -> Arc<AtomicBool> {
        self.flag.store(true, Ordering::Release);
        Arc::clone(&self.flag)
    }

    /// Cooperative-side pulse shaping. The pin is only written on edges.
    pub fn service(&mut self, now_us: u64) {
        if self.flag.swap(false, Ordering::AcqRel) {
            self.output_high = true;
            self.rise_at_us = now_us;
            self.pin.set(true);
        } else if self.output_high
            && now_us.saturating_sub(self.rise_at_us) > self.pulse_width_us
        {
            self.output_high = false;
            self.pin.set(false);
        }
    }
}
