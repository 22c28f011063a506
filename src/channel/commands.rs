//! Typed command handlers for one channel.
//!
//! Each handler implements the `arg == "?"` get / textual set contract of
//! the command surface: gets answer with the stringified value at the
//! documented precision, persisted sets answer `OK` (or fail with
//! [`CommandError::SaveFailed`] once every sub-write has been attempted),
//! and validation failures describe the reason without mutating any state.

use super::Channel;
use crate::app::ports::ByteStorage;
use crate::control::cal_table::CAL_TABLE_LEN;
use crate::error::CommandError;

/// Handler outcome: `Ok(body)` on success, `Err(error)` whose `Display`
/// body the transport prefixes with `ERROR `.
pub type CmdResult = Result<String, CommandError>;

/// Parse a finite float. Infinities and NaN are rejected like any other
/// malformed input.
fn parse_float(arg: &str) -> Option<f32> {
    arg.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Strict "0" / "1" boolean.
fn parse_bool(arg: &str) -> Option<bool> {
    match arg {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

/// atoi-style table index parse: optional sign, then however many leading
/// digits there are. Non-numeric input counts as zero, so only a numeric
/// out-of-range index is ever rejected.
fn parse_index(arg: &str) -> i32 {
    let trimmed = arg.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i32 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value
            .saturating_mul(10)
            .saturating_add((byte - b'0') as i32);
    }

    if negative {
        -value
    } else {
        value
    }
}

fn persist(channel: &mut Channel, storage: &mut dyn ByteStorage) -> CmdResult {
    if channel.save(storage) {
        Ok("OK".into())
    } else {
        Err(CommandError::SaveFailed)
    }
}

// ── State control ─────────────────────────────────────────────

/// `en` — enable/disable. Any write resets the PID; not persisted.
pub fn enable(channel: &mut Channel, arg: &str, _storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(if channel.is_enabled() { "1" } else { "0" }.into());
    }

    let Some(on) = parse_bool(arg) else {
        return Err(CommandError::Rejected("invalid value"));
    };

    channel.set_enabled(on);
    Ok("OK".into())
}

// ── Temperature setpoints ─────────────────────────────────────

/// `set_t` — temperature setpoint in °C, bounded by min/max.
pub fn temp_set(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.2}", channel.temp_sp()));
    }

    let Some(temp) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid float value"));
    };
    if temp < channel.temp_sp_min() || temp > channel.temp_sp_max() {
        return Err(CommandError::Rejected("out of bounds"));
    }

    channel.set_temp_sp(temp);
    persist(channel, storage)
}

/// `meas_t` — measured temperature, read only.
pub fn temp_measure(channel: &mut Channel, arg: &str, _storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.2}", channel.temp_pv()));
    }
    Err(CommandError::Rejected("command is read only"))
}

/// `set_min_t` — lower setpoint bound.
pub fn temp_set_min(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.0}", channel.temp_sp_min()));
    }

    let Some(value) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid float value"));
    };
    if value > channel.temp_sp_max() {
        return Err(CommandError::Rejected("max < min"));
    }
    if value < 0.0 {
        return Err(CommandError::Rejected("value < 0.0"));
    }

    channel.set_temp_sp_min(value);
    persist(channel, storage)
}

/// `set_max_t` — upper setpoint bound, limited by what the amplifier can
/// actually measure.
pub fn temp_set_max(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.0}", channel.temp_sp_max()));
    }

    let Some(value) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid float value"));
    };
    if value < channel.temp_sp_min() {
        return Err(CommandError::Rejected("min > max"));
    }
    if channel.cal().temp_to_tcv(value) > channel.tc_max_voltage_setpoint() {
        return Err(CommandError::Rejected(
            "temperature exceeds hardware capability",
        ));
    }

    channel.set_temp_sp_max(value);
    persist(channel, storage)
}

/// `runaway_t` — runaway trip temperature.
pub fn temp_runaway_threshold(
    channel: &mut Channel,
    arg: &str,
    storage: &mut dyn ByteStorage,
) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.1}", channel.temp_runaway_threshold()));
    }

    let Some(value) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid value"));
    };
    if value < 0.0 {
        return Err(CommandError::Rejected("value < 0.0"));
    }
    if channel.cal().temp_to_tcv(value) > channel.tc_max_voltage_setpoint() {
        return Err(CommandError::Rejected("value > max hardware limit"));
    }

    channel.set_temp_runaway_threshold(value);
    persist(channel, storage)
}

// ── Voltage-domain setpoints ──────────────────────────────────

/// `set_uv` — thermocouple voltage setpoint in µV.
pub fn voltage_setpoint(
    channel: &mut Channel,
    arg: &str,
    storage: &mut dyn ByteStorage,
) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.5}", channel.tc_voltage_sp()));
    }

    let Some(voltage) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid float value"));
    };
    if voltage < 0.0 {
        return Err(CommandError::Rejected("voltage < 0.0"));
    }
    if voltage > channel.tc_max_voltage_setpoint() {
        return Err(CommandError::Rejected(
            "voltage > max hardware tcv setpoint",
        ));
    }

    channel.set_tc_voltage_sp(voltage);
    persist(channel, storage)
}

/// `meas_uv` — measured thermocouple voltage, read only.
pub fn tc_read_voltage(
    channel: &mut Channel,
    arg: &str,
    _storage: &mut dyn ByteStorage,
) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.5}", channel.tc_voltage_pv()));
    }
    Err(CommandError::Rejected("value is read only"))
}

// ── PID parameters ────────────────────────────────────────────

/// `pid_kp` — proportional gain.
pub fn pid_kp(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.5}", channel.pid().kp));
    }

    let Some(value) = parse_float(arg).filter(|v| *v >= 0.0) else {
        return Err(CommandError::Rejected("invalid kp"));
    };

    channel.pid_mut().kp = value;
    persist(channel, storage)
}

/// `pid_ki` — integral gain (1/Ti).
pub fn pid_ki(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.5}", channel.pid().ki));
    }

    let Some(value) = parse_float(arg).filter(|v| *v >= 0.0) else {
        return Err(CommandError::Rejected("invalid Ki"));
    };

    channel.pid_mut().ki = value;
    persist(channel, storage)
}

/// `pid_kd` — derivative gain (Td).
pub fn pid_kd(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.5}", channel.pid().kd));
    }

    let Some(value) = parse_float(arg).filter(|v| *v >= 0.0) else {
        return Err(CommandError::Rejected("invalid kd"));
    };

    channel.pid_mut().kd = value;
    persist(channel, storage)
}

/// `pid_d_tau` — derivative low-pass time constant in seconds.
pub fn pid_derivative_tau(
    channel: &mut Channel,
    arg: &str,
    storage: &mut dyn ByteStorage,
) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.5}", channel.pid().derivative_tau));
    }

    let Some(value) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid float value"));
    };

    channel.pid_mut().derivative_tau = value;
    persist(channel, storage)
}

/// `pid_op` — PID output, read only.
pub fn pid_output(channel: &mut Channel, arg: &str, _storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.4}", channel.output()));
    }
    Err(CommandError::Rejected("value is read only"))
}

// ── Sleep ─────────────────────────────────────────────────────

/// `sleep_state` — read only.
pub fn sleep_state(channel: &mut Channel, arg: &str, _storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(if channel.sleep_state() { "1" } else { "0" }.into());
    }
    Err(CommandError::Rejected("command is read only"))
}

/// `sleep_set_t` — sleep setpoint in °C, stored as µV.
pub fn sleep_temp(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!(
            "{:.1}",
            channel.cal().tcv_to_temp(channel.sleep_voltage_sp())
        ));
    }

    let Some(temp) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid value"));
    };

    let voltage = channel.cal().temp_to_tcv(temp);
    if voltage < 0.0 {
        return Err(CommandError::Rejected("value < min hardware limit"));
    }
    if voltage > channel.tc_max_voltage_setpoint() {
        return Err(CommandError::Rejected("value > max hardware limit"));
    }

    channel.set_sleep_voltage_sp(voltage);
    persist(channel, storage)
}

/// `sleep_delay` — stand-to-sleep delay in milliseconds.
pub fn sleep_delay(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(format!("{:.2}", channel.sleep_delay_ms()));
    }

    let Some(value) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid value"));
    };
    if value < 0.0 {
        return Err(CommandError::Rejected("invalid value < 0"));
    }

    channel.set_sleep_delay_ms(value);
    persist(channel, storage)
}

// ── Calibration ───────────────────────────────────────────────

/// `tc_cal_table` — `?` for the table size, `<index>` to read one entry,
/// `<index>[v,t]` to replace one entry.
pub fn cal_table(channel: &mut Channel, arg: &str, storage: &mut dyn ByteStorage) -> CmdResult {
    if arg == "?" {
        return Ok(CAL_TABLE_LEN.to_string());
    }

    let is_set = arg.contains(['[', ',', ']']);
    if !is_set {
        let index = parse_index(arg);
        if index < 0 || index >= CAL_TABLE_LEN as i32 {
            return Err(CommandError::Rejected("Invalid index"));
        }
        return match channel.cal().point(index as usize) {
            Some(point) => Ok(format!("[{:.2},{:.2}]", point.voltage_uv, point.temp_c)),
            None => Err(CommandError::Rejected("Invalid index")),
        };
    }

    let (Some(open), Some(close)) = (arg.find('['), arg.find(']')) else {
        return Err(CommandError::Rejected("Format must be index[x,y]"));
    };
    let Some(comma) = arg[open..close.max(open)].find(',').map(|i| i + open) else {
        return Err(CommandError::Rejected("Format must be index[x,y]"));
    };

    let index = parse_index(&arg[..open]);
    if index < 0 || index >= CAL_TABLE_LEN as i32 {
        return Err(CommandError::Rejected("Invalid index"));
    }

    let (Some(voltage), Some(temp)) = (
        parse_float(&arg[open + 1..comma]),
        parse_float(&arg[comma + 1..close]),
    ) else {
        return Err(CommandError::Rejected("Invalid float value"));
    };

    channel.cal_mut().set_point(index as usize, voltage, temp);
    persist(channel, storage)
}

/// `restore` — factory reset seeded from a Seebeck coefficient in µV/K.
pub fn restore_defaults(
    channel: &mut Channel,
    arg: &str,
    storage: &mut dyn ByteStorage,
) -> CmdResult {
    let Some(seebeck) = parse_float(arg) else {
        return Err(CommandError::Rejected("invalid thermocouple S[uV/K]"));
    };
    if seebeck <= 0.0 || seebeck > 40.0 {
        return Err(CommandError::Rejected("S[uV/K] outside of range"));
    }

    channel.apply_restore(seebeck);
    persist(channel, storage)
}
