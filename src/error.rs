//! Unified error types for the station firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent storage operation failed.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from the byte-addressed persistent storage collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The address or address range falls outside the device.
    OutOfBounds,
    /// The device did not acknowledge a bus transaction.
    Nack,
    /// ACK polling after a write timed out.
    Timeout,
    /// A stored float decoded to NaN.
    CorruptFloat,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "address out of bounds"),
            Self::Nack => write!(f, "device NACK"),
            Self::Timeout => write!(f, "ACK-poll timeout"),
            Self::CorruptFloat => write!(f, "stored float is NaN"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Command-surface errors
// ---------------------------------------------------------------------------

/// Failure response from the command surface.
///
/// These are operator-facing, not internal: `Display` produces the exact
/// body reported back to the command origin (the transport adds the
/// `ERROR ` prefix). Parse and validation failures mutate no state and are
/// never retried; a persistence failure leaves the in-memory mutation
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The line did not parse as `id:command:arg`.
    Malformed,
    /// The addressed channel does not exist.
    InvalidDeviceId,
    /// The command name is not in the dispatch table.
    UnknownCommand,
    /// The argument failed a handler's validation; the payload says why.
    Rejected(&'static str),
    /// The record could not be persisted after a set.
    SaveFailed,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "Malformed command. Format: id:command:value_or_?"),
            Self::InvalidDeviceId => write!(f, "Invalid device ID"),
            Self::UnknownCommand => write!(f, "Unknown command"),
            Self::Rejected(reason) => write!(f, "{reason}"),
            Self::SaveFailed => write!(f, "FAIL TO SAVE"),
        }
    }
}

// ---------------------------------------------------------------------------
// Runaway interlock
// ---------------------------------------------------------------------------

/// Why a channel latched itself off.
///
/// Latched faults are not errors in the `Result` sense: the channel recovers
/// locally (disable, force LOW, reset PID) and the cause is only surfaced in
/// the log and indirectly through `en?` reading "0".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunawayCause {
    /// Process temperature exceeded the configured runaway threshold.
    OverTemperature,
    /// The ADC read full-scale: open thermocouple or saturated amplifier.
    SensorSaturated,
}

impl fmt::Display for RunawayCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverTemperature => write!(f, "over temperature"),
            Self::SensorSaturated => write!(f, "sensor chain saturated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
