//! Multi-channel soldering station control core.
//!
//! Drives mains-powered resistive heaters for thermocouple-tipped irons
//! (JBC-compatible) through zero-crossing solid-state switches, holding
//! each tip to its setpoint with a per-channel PID loop.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  EspAdc / SimAdc    EspOutputPin     EepromStorage            │
//! │  (AdcInput)         (DigitalOutput)  (ByteStorage)            │
//! │  UartLink / ConsoleLink  Display     TimeAdapter              │
//! │  (SerialLink)            (HmiPanel)  (Clock)                  │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ────────────────────    │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │  Station (cooperative loop)                             │  │
//! │  │   Channel × 4 · Pid · CalTable · persistence · cli      │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │  ZeroCrossScheduler (interrupt context)                 │  │
//! │  │   burst firing · sample windows · heartbeat flag        │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two execution contexts meet only at the per-channel atomic scalars
//! in [`channel::ChannelShared`] and the heartbeat flag; there are no locks
//! anywhere on the control path.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channel;
pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod heartbeat;
pub mod hmi;
pub mod pins;
pub mod scheduler;
