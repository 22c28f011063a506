//! Operator-display snapshot of a channel.
//!
//! Field names are configuration, not code: each channel carries an
//! [`HmiBinding`] naming the display fields it owns. Bindings may omit
//! fields and may share field names between channels (the stock four-channel
//! panel displays channels 1 and 2 through shared `h23…` elements and gives
//! channel 2 only a measurement and an output bar).

use super::Channel;
use crate::app::ports::HmiPanel;

/// 16-bit RGB565 colors used by the stock panel.
pub const HMI_COLOR_GREEN: u32 = 34784;
pub const HMI_COLOR_RED: u32 = 63504;

/// Display field names for one channel. `None` skips the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmiBinding {
    /// Measured temperature text field.
    pub measured: Option<&'static str>,
    /// Setpoint temperature text field.
    pub setpoint: Option<&'static str>,
    /// Output percentage value field.
    pub output: Option<&'static str>,
    /// Enable label field (text + color).
    pub enable: Option<&'static str>,
    /// Sleep label field.
    pub sleep: Option<&'static str>,
}

/// Bindings for the stock four-channel display layout.
pub const STOCK_BINDINGS: [HmiBinding; 4] = [
    HmiBinding {
        measured: Some("h1meas"),
        setpoint: Some("h1set"),
        output: Some("h1op"),
        enable: Some("h1en"),
        sleep: Some("h1slp"),
    },
    HmiBinding {
        measured: Some("h2meas"),
        setpoint: Some("h23set"),
        output: Some("h2op"),
        enable: Some("h23en"),
        sleep: Some("h23slp"),
    },
    HmiBinding {
        measured: Some("h3meas"),
        setpoint: None,
        output: Some("h3op"),
        enable: None,
        sleep: None,
    },
    HmiBinding {
        measured: Some("h4meas"),
        setpoint: Some("h4set"),
        output: Some("h4op"),
        enable: Some("h4en"),
        sleep: Some("h4slp"),
    },
];

impl Channel {
    /// Burst-firing duty as a rounded percentage.
    pub fn output_percent(&self) -> i32 {
        (self.output() * 100.0).round() as i32
    }

    /// Measured temperature, whole degrees.
    pub fn measured_text(&self) -> String {
        format!("{:.0}", self.cal.tcv_to_temp(self.tc_voltage_pv))
    }

    /// Setpoint temperature, whole degrees.
    pub fn setpoint_text(&self) -> String {
        format!("{:.0}", self.temp_sp)
    }

    pub fn state_text(&self) -> &'static str {
        if self.is_enabled() {
            "ON"
        } else {
            "OFF"
        }
    }

    pub fn state_color(&self) -> u32 {
        if self.is_enabled() {
            HMI_COLOR_GREEN
        } else {
            HMI_COLOR_RED
        }
    }

    pub fn sleep_text(&self) -> &'static str {
        if self.sleep_state() {
            "SLEEP"
        } else {
            ""
        }
    }

    /// Push every bound field to the panel.
    pub(super) fn push_snapshot(&self, panel: &mut dyn HmiPanel) {
        if let Some(field) = self.binding.measured {
            panel.push_text(field, &self.measured_text());
        }
        if let Some(field) = self.binding.setpoint {
            panel.push_text(field, &self.setpoint_text());
        }
        if let Some(field) = self.binding.output {
            panel.push_value(field, self.output_percent());
        }
        if let Some(field) = self.binding.enable {
            panel.push_text(field, self.state_text());
            panel.push_color(field, self.state_color());
        }
        if let Some(field) = self.binding.sleep {
            panel.push_text(field, self.sleep_text());
        }
    }
}
