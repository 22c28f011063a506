//! One heater/thermocouple channel.
//!
//! A channel couples hard-real-time ISR work (burst firing, sample-window
//! gating — see [`shared::ChannelShared`]) with cooperative loop work: ADC
//! acquisition after the amplifier recovery delay, PID compute, the stand
//! sleep state machine, the runaway interlock, and throttled HMI snapshots.
//!
//! ```text
//! INIT ──init()──► IDLE ──enable=1──► RUNNING ──runaway──► FAULT
//!                  ▲                       │                   │
//!                  └───────enable=0────────┘  (FAULT = IDLE + latched off)
//!                                 ↕
//!                           AWAKE↔SLEEP (RUNNING substates)
//! ```
//!
//! The heater and the thermocouple amplifier share an electrical path, so
//! the two states are mutually exclusive: while a sample window is open the
//! heater is held LOW, and a reading is only taken once the amplifier has
//! recovered from heater switching.

pub mod commands;
pub mod hmi;
pub mod persist;
pub mod shared;

use std::sync::Arc;

use log::{debug, info, warn};

use crate::app::ports::{ByteStorage, HmiPanel};
use crate::config::{StationConfig, ADC_FULL_SCALE, ADC_RESOLUTION, ADC_VREF};
use crate::control::cal_table::CalTable;
use crate::control::pid::Pid;
use crate::error::RunawayCause;

pub use hmi::HmiBinding;
pub use shared::ChannelShared;

/// Seebeck coefficient used to seed the factory calibration table (µV/K).
const FACTORY_SEEBECK_UV_PER_K: f32 = 10.0;
/// Factory temperature setpoint (°C).
const FACTORY_TEMP_SP_C: f32 = 300.0;

/// Hardware handles for one channel.
pub struct ChannelIo {
    pub adc: Box<dyn crate::app::ports::AdcInput>,
    pub heater: Box<dyn crate::app::ports::DigitalOutput>,
    pub stand: Box<dyn crate::app::ports::StandSense>,
}

/// Stand-detection sleep state machine.
///
/// Transitions are evaluated only while the channel is enabled. Resting the
/// iron starts the delay; lifting it wakes the channel immediately from
/// either pending or sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SleepPhase {
    Awake,
    StandPending { since_ms: u64 },
    Sleeping,
}

/// One physical heater + thermocouple pair.
pub struct Channel {
    shared: Arc<ChannelShared>,
    adc: Box<dyn crate::app::ports::AdcInput>,
    stand: Box<dyn crate::app::ports::StandSense>,

    index: usize,
    tc_gain: f32,
    tc_max_voltage_sp: f32,
    storage_base: usize,

    // Setpoint domain
    temp_sp: f32,
    temp_sp_min: f32,
    temp_sp_max: f32,
    temp_runaway_threshold: f32,
    tc_voltage_sp: f32,
    sleep_voltage_sp: f32,

    // Process
    tc_voltage_pv: f32,
    temp_pv: f32,
    pv_timestamp_us: u64,
    pv_prev_timestamp_us: u64,

    // Control
    pid: Pid,
    pid_update_pending: bool,

    // Sleep
    sleep: SleepPhase,
    sleep_delay_ms: f32,

    // Calibration
    cal: CalTable,

    // HMI
    binding: HmiBinding,
    hmi_last_update_ms: u64,

    // Station timing
    amp_recovery_us: u64,
    hmi_update_interval_ms: u64,
}

impl Channel {
    /// Create a channel from its hardware identity.
    ///
    /// Does not touch hardware or storage; call [`init`](Self::init) next.
    pub fn new(
        index: usize,
        io: ChannelIo,
        tc_gain: f32,
        storage_base: usize,
        binding: HmiBinding,
        config: &StationConfig,
    ) -> Self {
        let mut channel = Self {
            shared: Arc::new(ChannelShared::new(io.heater)),
            adc: io.adc,
            stand: io.stand,

            index,
            tc_gain,
            tc_max_voltage_sp: ADC_VREF * 1e6 / tc_gain,
            storage_base,

            temp_sp: 0.0,
            temp_sp_min: 0.0,
            temp_sp_max: 0.0,
            temp_runaway_threshold: 0.0,
            tc_voltage_sp: 0.0,
            sleep_voltage_sp: 0.0,

            tc_voltage_pv: 0.0,
            temp_pv: 0.0,
            pv_timestamp_us: 0,
            pv_prev_timestamp_us: 0,

            pid: Pid::new(),
            pid_update_pending: false,

            sleep: SleepPhase::Awake,
            sleep_delay_ms: 0.0,

            cal: CalTable::linear(FACTORY_SEEBECK_UV_PER_K),

            binding,
            hmi_last_update_ms: 0,

            amp_recovery_us: config.amp_recovery_us,
            hmi_update_interval_ms: config.hmi_update_interval_ms,
        };

        channel.apply_factory_defaults();
        channel
    }

    /// Force the heater LOW, load the persisted record (factory defaults
    /// stay in place if any read fails) and reset the PID.
    pub fn init(&mut self, storage: &mut dyn ByteStorage) {
        self.shared.force_low();

        if self.load(storage) {
            info!("channel {}: configuration loaded", self.index);
        } else {
            warn!(
                "channel {}: no valid stored configuration, using factory defaults",
                self.index
            );
        }

        self.pid_reset();
    }

    /// Handle for the zero-cross scheduler.
    pub fn shared_handle(&self) -> Arc<ChannelShared> {
        Arc::clone(&self.shared)
    }

    // ── Cooperative loop ──────────────────────────────────────

    /// One loop pass: sample acquisition, PID, HMI cadence, stand machine.
    pub fn service(&mut self, now_us: u64, panel: &mut dyn HmiPanel) {
        self.poll_sample(now_us);
        self.poll_pid();
        self.poll_hmi(now_us / 1000, panel);
        self.poll_stand(now_us / 1000);
    }

    /// Acquire the scheduled thermocouple sample once the amplifier has
    /// recovered from the heater being switched off.
    fn poll_sample(&mut self, now_us: u64) {
        if !self.shared.sample_scheduled() {
            return;
        }
        let elapsed_us = now_us.saturating_sub(self.shared.scheduled_at_us());
        if elapsed_us <= self.amp_recovery_us {
            return;
        }

        let counts = self.adc.read_counts();
        let adc_volts = counts as f32 / ADC_RESOLUTION * ADC_VREF;
        self.tc_voltage_pv = adc_volts / self.tc_gain * 1e6;
        self.temp_pv = self.cal.tcv_to_temp(self.tc_voltage_pv);

        let first_sample = self.pv_timestamp_us == 0;
        self.pv_prev_timestamp_us = self.pv_timestamp_us;
        self.pv_timestamp_us = now_us;

        if first_sample {
            // Keep the window open so this sample is retaken and the next
            // one carries a well-defined dt. No PID update from this one.
        } else {
            self.shared.clear_sample_scheduled();
            self.pid_update_pending = true;
        }

        // Runaway interlock: latched off until an explicit enable.
        if self.temp_pv > self.temp_runaway_threshold {
            self.latch_off(RunawayCause::OverTemperature);
        } else if counts >= ADC_FULL_SCALE {
            self.latch_off(RunawayCause::SensorSaturated);
        }
    }

    /// Run the PID on a freshly acquired sample.
    fn poll_pid(&mut self) {
        if !self.pid_update_pending || !self.shared.is_enabled() {
            return;
        }

        let dt = (self.pv_timestamp_us - self.pv_prev_timestamp_us) as f32 / 1e6;
        let sp = if self.sleep_state() {
            self.sleep_voltage_sp
        } else {
            self.tc_voltage_sp
        };

        let span = self.tc_max_voltage_sp;
        let error = sp / span - self.tc_voltage_pv / span;

        if let Some(output) = self.pid.update(error, dt) {
            self.shared.set_output(output);
        }
        self.pid_update_pending = false;
    }

    /// Push an HMI snapshot at most once per update interval.
    fn poll_hmi(&mut self, now_ms: u64, panel: &mut dyn HmiPanel) {
        if now_ms.saturating_sub(self.hmi_last_update_ms) > self.hmi_update_interval_ms {
            self.push_snapshot(panel);
            self.hmi_last_update_ms = now_ms;
        }
    }

    /// Evaluate the stand-detection sleep machine.
    fn poll_stand(&mut self, now_ms: u64) {
        if !self.shared.is_enabled() {
            return;
        }

        let on_stand = self.stand.on_stand();
        self.sleep = match self.sleep {
            SleepPhase::Awake if on_stand => SleepPhase::StandPending { since_ms: now_ms },
            SleepPhase::StandPending { .. } if !on_stand => SleepPhase::Awake,
            SleepPhase::StandPending { since_ms }
                if now_ms.saturating_sub(since_ms) as f32 >= self.sleep_delay_ms =>
            {
                debug!("channel {}: entering sleep setpoint", self.index);
                SleepPhase::Sleeping
            }
            SleepPhase::Sleeping if !on_stand => {
                debug!("channel {}: waking from sleep", self.index);
                SleepPhase::Awake
            }
            unchanged => unchanged,
        };
    }

    // ── State control ─────────────────────────────────────────

    /// Enable or disable the channel. Either transition resets the PID;
    /// disabling also forces the heater LOW.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.shared.set_enabled(enabled);
        self.pid_reset();
        if !enabled {
            self.shared.force_low();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.is_enabled()
    }

    /// Disable, reset and force LOW. Recovery requires an explicit enable.
    fn latch_off(&mut self, cause: RunawayCause) {
        warn!(
            "channel {}: runaway interlock ({cause}), pv = {:.1} C",
            self.index, self.temp_pv
        );
        self.shared.set_enabled(false);
        self.pid_reset();
        self.shared.force_low();
    }

    /// Reset PID state and the sample pipeline.
    fn pid_reset(&mut self) {
        self.pid.reset(self.tc_voltage_pv);
        self.pid_update_pending = false;
        self.pv_timestamp_us = 0;
        self.pv_prev_timestamp_us = 0;
        self.shared.set_output(0.0);
    }

    // ── Typed accessors (command surface, HMI) ────────────────

    pub fn temp_sp(&self) -> f32 {
        self.temp_sp
    }

    /// Set the temperature setpoint; the control loop reasons in µV so the
    /// voltage setpoint is derived through the calibration table.
    pub fn set_temp_sp(&mut self, temp_c: f32) {
        self.temp_sp = temp_c;
        self.tc_voltage_sp = self.cal.temp_to_tcv(temp_c);
    }

    pub fn temp_pv(&self) -> f32 {
        self.temp_pv
    }

    pub fn tc_voltage_pv(&self) -> f32 {
        self.tc_voltage_pv
    }

    pub fn tc_voltage_sp(&self) -> f32 {
        self.tc_voltage_sp
    }

    /// Set the thermocouple voltage setpoint directly (µV); the displayed
    /// temperature setpoint follows through the calibration table.
    pub fn set_tc_voltage_sp(&mut self, voltage_uv: f32) {
        self.tc_voltage_sp = voltage_uv;
        self.temp_sp = self.cal.tcv_to_temp(voltage_uv);
    }

    pub fn temp_sp_min(&self) -> f32 {
        self.temp_sp_min
    }

    pub fn set_temp_sp_min(&mut self, temp_c: f32) {
        self.temp_sp_min = temp_c;
    }

    pub fn temp_sp_max(&self) -> f32 {
        self.temp_sp_max
    }

    pub fn set_temp_sp_max(&mut self, temp_c: f32) {
        self.temp_sp_max = temp_c;
    }

    pub fn temp_runaway_threshold(&self) -> f32 {
        self.temp_runaway_threshold
    }

    pub fn set_temp_runaway_threshold(&mut self, temp_c: f32) {
        self.temp_runaway_threshold = temp_c;
    }

    pub fn sleep_voltage_sp(&self) -> f32 {
        self.sleep_voltage_sp
    }

    pub fn set_sleep_voltage_sp(&mut self, voltage_uv: f32) {
        self.sleep_voltage_sp = voltage_uv;
    }

    pub fn sleep_delay_ms(&self) -> f32 {
        self.sleep_delay_ms
    }

    pub fn set_sleep_delay_ms(&mut self, delay_ms: f32) {
        self.sleep_delay_ms = delay_ms;
    }

    /// True iff the sleep machine is in SLEEP.
    pub fn sleep_state(&self) -> bool {
        self.sleep == SleepPhase::Sleeping
    }

    /// Current burst-firing duty in [0, 1].
    pub fn output(&self) -> f32 {
        self.shared.output()
    }

    /// The largest representable thermocouple voltage setpoint (µV),
    /// `ADC_VREF · 10⁶ / G`.
    pub fn tc_max_voltage_setpoint(&self) -> f32 {
        self.tc_max_voltage_sp
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn pid_mut(&mut self) -> &mut Pid {
        &mut self.pid
    }

    pub fn cal(&self) -> &CalTable {
        &self.cal
    }

    pub fn cal_mut(&mut self) -> &mut CalTable {
        &mut self.cal
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
