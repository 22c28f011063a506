//! Command-surface behavior across the whole station: framing, precision,
//! error bodies, and the HMI command path.

use crate::mock_hw::StationHarness;

use ironstation::app::ports::{Clock, SerialLink};
use ironstation::hmi::Display;

#[test]
fn malformed_unknown_and_bad_id_bodies() {
    let mut hw = StationHarness::new(4);

    assert_eq!(
        hw.eval("0:set_t").unwrap_err().to_string(),
        "Malformed command. Format: id:command:value_or_?"
    );
    assert_eq!(
        hw.eval("9:en:?").unwrap_err().to_string(),
        "Invalid device ID"
    );
    assert_eq!(
        hw.eval(":en:?").unwrap_err().to_string(),
        "Invalid device ID"
    );
    assert_eq!(
        hw.eval("0:nope:?").unwrap_err().to_string(),
        "Unknown command"
    );
}

#[test]
fn get_precisions_match_the_documented_table() {
    let mut hw = StationHarness::new(1);

    // Factory defaults through every getter.
    assert_eq!(hw.eval("0:en:?").unwrap(), "0");
    assert_eq!(hw.eval("0:set_t:?").unwrap(), "300.00");
    assert_eq!(hw.eval("0:meas_t:?").unwrap(), "0.00");
    assert_eq!(hw.eval("0:meas_uv:?").unwrap(), "0.00000");
    assert_eq!(hw.eval("0:sleep_state:?").unwrap(), "0");
    assert_eq!(hw.eval("0:pid_op:?").unwrap(), "0.0000");
    assert_eq!(hw.eval("0:runaway_t:?").unwrap(), "480.0");
    assert_eq!(hw.eval("0:set_min_t:?").unwrap(), "100");
    assert_eq!(hw.eval("0:set_max_t:?").unwrap(), "400");
    assert_eq!(hw.eval("0:set_uv:?").unwrap(), "3000.00000");
    assert_eq!(hw.eval("0:pid_kp:?").unwrap(), "0.00000");
    assert_eq!(hw.eval("0:pid_ki:?").unwrap(), "0.00000");
    assert_eq!(hw.eval("0:pid_kd:?").unwrap(), "0.00000");
    assert_eq!(hw.eval("0:pid_d_tau:?").unwrap(), "0.25000");
    assert_eq!(hw.eval("0:sleep_set_t:?").unwrap(), "150.0");
    assert_eq!(hw.eval("0:sleep_delay:?").unwrap(), "30000.00");
    assert_eq!(hw.eval("0:tc_cal_table:?").unwrap(), "10");
}

#[test]
fn restore_reseeds_the_channel() {
    let mut hw = StationHarness::new(1);
    hw.eval("0:pid_kp:3").unwrap();
    hw.eval("0:set_max_t:420").unwrap();

    assert_eq!(hw.eval("0:restore:7").unwrap(), "OK");

    assert_eq!(hw.eval("0:pid_kp:?").unwrap(), "0.00000");
    assert_eq!(hw.eval("0:set_min_t:?").unwrap(), "100");
    assert_eq!(hw.eval("0:set_max_t:?").unwrap(), "400");
    assert_eq!(hw.eval("0:tc_cal_table:9").unwrap(), "[3150.00,450.00]");
    // The Seebeck argument lands in the voltage setpoint as-is.
    assert_eq!(hw.eval("0:set_uv:?").unwrap(), "7.00000");

    assert_eq!(
        hw.eval("0:restore:41").unwrap_err().to_string(),
        "S[uV/K] outside of range"
    );
}

#[test]
fn parse_failures_leave_state_untouched() {
    let mut hw = StationHarness::new(1);
    let before = hw.eval("0:set_t:?").unwrap();

    assert!(hw.eval("0:set_t:abc").is_err());
    assert!(hw.eval("0:set_t:nan").is_err());
    assert!(hw.eval("0:set_t:inf").is_err());
    assert_eq!(hw.eval("0:set_t:?").unwrap(), before);
}

// ── HMI command path ──────────────────────────────────────────

#[derive(Clone, Default)]
struct SharedLink {
    rx: std::rc::Rc<std::cell::RefCell<std::collections::VecDeque<u8>>>,
    tx: std::rc::Rc<std::cell::RefCell<Vec<u8>>>,
}

impl SerialLink for SharedLink {
    fn readable(&mut self) -> bool {
        !self.rx.borrow().is_empty()
    }
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.borrow_mut().pop_front()
    }
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.tx.borrow_mut().extend_from_slice(bytes);
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn micros(&self) -> u64 {
        0
    }
}

#[test]
fn hmi_lines_route_to_the_parser_and_respond_on_the_link() {
    let mut hw = StationHarness::new(1);

    let link = SharedLink::default();
    let mut display = Display::new(link.clone(), 20);

    link.rx
        .borrow_mut()
        .extend(b"0:en:1\xFF\xFF\xFF".iter().copied());

    let line = display.poll_line(&FixedClock).expect("line expected");
    let result = hw.station.eval_command(&line, &mut hw.storage);
    display.send_response(&result);

    assert_eq!(hw.eval("0:en:?").unwrap(), "1");
    assert_eq!(link.tx.borrow().as_slice(), b"OK\xFF\xFF\xFF");
}
