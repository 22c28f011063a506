//! Port traits — the hexagonal boundary between domain logic and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Channel / Station (domain)
//! ```
//!
//! Driven adapters (ADC, GPIO, EEPROM, display serial) implement these
//! traits. The domain consumes them via trait objects injected at channel
//! construction, so the control core never touches hardware directly and the
//! whole crate is testable on the host.
//!
//! ## Interrupt-context contract
//!
//! [`DigitalOutput`] is the only port callable from the zero-cross ISR. It
//! takes `&self`, must not block or allocate, and implementations must be a
//! direct register write (or an atomic in simulation). Everything else runs
//! in the cooperative loop only.

use crate::error::StorageError;

// ───────────────────────────────────────────────────────────────
// Analog input (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw ADC access for one thermocouple amplifier output.
pub trait AdcInput {
    /// Read the ADC once. Full scale is `config::ADC_FULL_SCALE`.
    fn read_counts(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Digital output (ISR-callable)
// ───────────────────────────────────────────────────────────────

/// A single digital output pin (heater SSR drive, heartbeat).
///
/// `set` is called from both the zero-cross ISR and the cooperative loop,
/// hence `&self` and the `Send + Sync` bound. Implementations must be a
/// single direct register write.
pub trait DigitalOutput: Send + Sync {
    fn set(&self, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Stand sense input
// ───────────────────────────────────────────────────────────────

/// Stand sensor for one channel.
///
/// The electrical contract is LOW = iron resting on its stand; adapters fold
/// the polarity so the domain only sees `on_stand`.
pub trait StandSense {
    fn on_stand(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Monotonic clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.
pub trait Clock {
    /// Microseconds since boot.
    fn micros(&self) -> u64;

    /// Milliseconds since boot.
    fn millis(&self) -> u64 {
        self.micros() / 1000
    }
}

// ───────────────────────────────────────────────────────────────
// Byte-addressed persistent storage
// ───────────────────────────────────────────────────────────────

/// Byte-addressed persistent storage (I²C EEPROM or in-memory stand-in).
///
/// Float accessors have default implementations over the byte accessors:
/// IEEE-754 little-endian raw 4-byte copies. A read that decodes to NaN is
/// reported as [`StorageError::CorruptFloat`], which makes an erased or
/// corrupted record distinguishable from a valid one.
pub trait ByteStorage {
    fn read_byte(&mut self, addr: usize) -> Result<u8, StorageError>;
    fn write_byte(&mut self, addr: usize, data: u8) -> Result<(), StorageError>;

    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;
    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Read a little-endian IEEE-754 float. NaN is a failure.
    fn read_float(&mut self, addr: usize) -> Result<f32, StorageError> {
        let mut bytes = [0u8; 4];
        self.read_bytes(addr, &mut bytes)?;
        let value = f32::from_le_bytes(bytes);
        if value.is_nan() {
            return Err(StorageError::CorruptFloat);
        }
        Ok(value)
    }

    /// Write a little-endian IEEE-754 float.
    fn write_float(&mut self, addr: usize, value: f32) -> Result<(), StorageError> {
        self.write_bytes(addr, &value.to_le_bytes())
    }
}

// ───────────────────────────────────────────────────────────────
// HMI panel (driven adapter: domain → display)
// ───────────────────────────────────────────────────────────────

/// Capability object for pushing channel snapshots to the operator display.
///
/// Channels know their own field bindings; the panel only knows how to write
/// a field. Adapters decide the wire format (Nextion-style ASCII commands on
/// the real display, a recording vector in tests).
pub trait HmiPanel {
    fn push_text(&mut self, field: &str, text: &str);
    fn push_value(&mut self, field: &str, value: i32);
    fn push_color(&mut self, field: &str, color: u32);
}

// ───────────────────────────────────────────────────────────────
// Serial link (HMI / USB byte streams)
// ───────────────────────────────────────────────────────────────

/// A byte-oriented serial link with non-blocking reads.
pub trait SerialLink {
    /// True if at least one byte is waiting.
    fn readable(&mut self) -> bool;

    /// Read one byte if available.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]);
}
