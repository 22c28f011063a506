//! Station configuration parameters.
//!
//! All tunable timing parameters for the control core. Per-channel
//! configuration (setpoints, PID gains, calibration) lives in the channel
//! itself and is persisted to EEPROM; this module holds the station-wide
//! constants that are fixed at build time.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ADC characteristics
// ---------------------------------------------------------------------------

/// ADC resolution in bits.
pub const ADC_BITS: u32 = 12;
/// ADC resolution as a count (2^12).
pub const ADC_RESOLUTION: f32 = 4096.0;
/// Highest raw reading the ADC can produce.
///
/// A reading at this count means the thermocouple amplifier is saturated or
/// the sensor is open, and trips the runaway interlock.
pub const ADC_FULL_SCALE: u16 = 4095;
/// ADC reference voltage in Volt.
pub const ADC_VREF: f32 = 3.3;

// ---------------------------------------------------------------------------
// Station configuration
// ---------------------------------------------------------------------------

/// Core station configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    // --- Zero-cross drive ---
    /// Half-cycles per burst-firing window. One sample is taken per window,
    /// leaving N-1 firing opportunities with 1/N power resolution.
    pub zero_cross_period: u32,
    /// Settling time after the heater is forced LOW before the thermocouple
    /// amplifier output is trustworthy (microseconds).
    pub amp_recovery_us: u64,

    // --- Liveness ---
    /// Heartbeat pulse width (microseconds).
    pub heartbeat_pulse_us: u64,

    // --- Interfaces ---
    /// Minimum interval between HMI snapshot pushes per channel (ms).
    pub hmi_update_interval_ms: u64,
    /// Serial read timeout for the HMI link (ms).
    pub serial_timeout_ms: u64,
    /// EEPROM write ACK-poll timeout (ms).
    pub storage_ack_timeout_ms: u64,

    // --- Baud rates ---
    /// HMI display serial baud rate. The USB console is CDC and has no
    /// line rate to configure.
    pub hmi_baud: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            // Zero-cross drive
            zero_cross_period: 10,
            amp_recovery_us: 1700,

            // Liveness
            heartbeat_pulse_us: 5000,

            // Interfaces
            hmi_update_interval_ms: 200,
            serial_timeout_ms: 20,
            storage_ack_timeout_ms: 7,

            // Baud rates
            hmi_baud: 115_200,
        }
    }
}
