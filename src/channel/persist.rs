//! Channel record persistence.
//!
//! Each channel owns a fixed 120-byte record in byte-addressed storage,
//! starting at its base offset: ten configuration scalars followed by the
//! ten calibration pairs, all little-endian IEEE-754 floats.
//!
//! | offset | field |
//! |-------:|-------|
//! |      0 | tc_voltage_sp |
//! |      4 | temp_sp_min |
//! |      8 | temp_sp_max |
//! |     12 | kp |
//! |     16 | ki |
//! |     20 | kd |
//! |     24 | derivative_tau |
//! |     28 | sleep_delay_ms |
//! |     32 | sleep_voltage_sp |
//! |     36 | temp_runaway_threshold |
//! |     40 | 10 × (voltage_uv, temp_c) |

use log::warn;

use super::Channel;
use crate::app::ports::ByteStorage;
use crate::control::cal_table::{CalTable, CAL_TABLE_LEN};

/// Number of configuration scalars ahead of the calibration table.
const RECORD_SCALAR_COUNT: usize = 10;

const FLOAT_SIZE: usize = core::mem::size_of::<f32>();

/// Bytes occupied by one channel's record.
pub const RECORD_FOOTPRINT: usize =
    FLOAT_SIZE * RECORD_SCALAR_COUNT + FLOAT_SIZE * 2 * CAL_TABLE_LEN;

impl Channel {
    /// The record scalars in their fixed order.
    fn record_scalars(&self) -> [f32; RECORD_SCALAR_COUNT] {
        [
            self.tc_voltage_sp,
            self.temp_sp_min,
            self.temp_sp_max,
            self.pid.kp,
            self.pid.ki,
            self.pid.kd,
            self.pid.derivative_tau,
            self.sleep_delay_ms,
            self.sleep_voltage_sp,
            self.temp_runaway_threshold,
        ]
    }

    /// Persist the whole record.
    ///
    /// A failed sub-write does not abort: the remaining writes are still
    /// attempted so one bad cell cannot shadow the rest of the record, and
    /// the failure is reported once at the end.
    pub fn save(&mut self, storage: &mut dyn ByteStorage) -> bool {
        let mut addr = self.storage_base;
        let mut ok = true;

        for value in self.record_scalars() {
            ok &= storage.write_float(addr, value).is_ok();
            addr += FLOAT_SIZE;
        }

        for point in self.cal.points() {
            ok &= storage.write_float(addr, point.voltage_uv).is_ok();
            addr += FLOAT_SIZE;
            ok &= storage.write_float(addr, point.temp_c).is_ok();
            addr += FLOAT_SIZE;
        }

        if !ok {
            warn!("channel {}: record save failed", self.index);
        }
        ok
    }

    /// Load the whole record.
    ///
    /// All-or-nothing: every float is read into scratch first and the
    /// in-memory state is only committed when the complete record decoded,
    /// so a partial or corrupt record leaves the current defaults intact.
    /// On success `temp_sp` is recomputed from the loaded voltage setpoint.
    pub fn load(&mut self, storage: &mut dyn ByteStorage) -> bool {
        let mut addr = self.storage_base;

        let mut scalars = [0.0f32; RECORD_SCALAR_COUNT];
        for slot in scalars.iter_mut() {
            match storage.read_float(addr) {
                Ok(value) => *slot = value,
                Err(_) => return false,
            }
            addr += FLOAT_SIZE;
        }

        let mut points = [(0.0f32, 0.0f32); CAL_TABLE_LEN];
        for pair in points.iter_mut() {
            let voltage = match storage.read_float(addr) {
                Ok(v) => v,
                Err(_) => return false,
            };
            addr += FLOAT_SIZE;
            let temp = match storage.read_float(addr) {
                Ok(t) => t,
                Err(_) => return false,
            };
            addr += FLOAT_SIZE;
            *pair = (voltage, temp);
        }

        let [tc_voltage_sp, temp_sp_min, temp_sp_max, kp, ki, kd, derivative_tau, sleep_delay_ms, sleep_voltage_sp, temp_runaway_threshold] =
            scalars;

        self.tc_voltage_sp = tc_voltage_sp;
        self.temp_sp_min = temp_sp_min;
        self.temp_sp_max = temp_sp_max;
        self.pid.kp = kp;
        self.pid.ki = ki;
        self.pid.kd = kd;
        self.pid.derivative_tau = derivative_tau;
        self.sleep_delay_ms = sleep_delay_ms;
        self.sleep_voltage_sp = sleep_voltage_sp;
        self.temp_runaway_threshold = temp_runaway_threshold;

        for (i, (voltage, temp)) in points.into_iter().enumerate() {
            self.cal.set_point(i, voltage, temp);
        }

        self.temp_sp = self.cal.tcv_to_temp(self.tc_voltage_sp);
        true
    }

    /// Reset every persisted field to factory values, seeding the
    /// calibration table for an ideal thermocouple with the given Seebeck
    /// coefficient (µV/K).
    ///
    /// The Seebeck argument also becomes the initial voltage setpoint, as on
    /// the shipped station.
    /// TODO: confirm whether `restore` should instead seed the voltage
    /// setpoint from a temperature through the fresh table.
    pub fn apply_restore(&mut self, s_uv_per_k: f32) {
        self.cal = CalTable::linear(s_uv_per_k);

        self.temp_sp_min = 100.0;
        self.temp_sp_max = 400.0;

        self.pid.kp = 0.0;
        self.pid.ki = 0.0;
        self.pid.kd = 0.0;
        self.pid.derivative_tau = 0.25;

        self.sleep_delay_ms = 30_000.0;
        self.sleep_voltage_sp = self.cal.temp_to_tcv(150.0);
        self.temp_runaway_threshold = 480.0;

        self.tc_voltage_sp = s_uv_per_k;
        self.temp_sp = self.cal.tcv_to_temp(self.tc_voltage_sp);
    }

    /// Factory defaults applied at construction, before any load. Same
    /// recipe as a restore with the nominal Seebeck coefficient, except the
    /// setpoint starts at a usable soldering temperature.
    pub(super) fn apply_factory_defaults(&mut self) {
        self.apply_restore(super::FACTORY_SEEBECK_UV_PER_K);
        self.set_temp_sp(super::FACTORY_TEMP_SP_C);
    }
}
