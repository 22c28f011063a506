//! Operator display protocol (Nextion-style serial panel).
//!
//! Outbound traffic is ASCII field assignments, each closed by three 0xFF
//! bytes:
//!
//! ```text
//!   h1meas.txt="327"⟨FF FF FF⟩
//!   h1op.val=42⟨FF FF FF⟩
//!   h1en.pco=34784⟨FF FF FF⟩
//! ```
//!
//! Inbound lines use the same 0xFF terminator. Lines starting with the
//! three-character preamble `xxx` are internal to the panel link: `xxxP`
//! pauses outbound field updates (the panel is redrawing a page), `xxxR`
//! resumes them. Every other line is an operator command and is routed
//! through the same parser as USB; the response returns over this link.

use heapless::Vec as HVec;

use crate::app::ports::{Clock, HmiPanel, SerialLink};
use crate::channel::commands::CmdResult;

/// Terminator byte, repeated [`TERMINATOR_LEN`] times.
pub const TERMINATOR: u8 = 0xFF;
pub const TERMINATOR_LEN: usize = 3;

/// Prefix marking a panel-internal line.
const INTERNAL_PREAMBLE: &str = "xxx";
const CMD_PAUSE_UPDATE: u8 = b'P';
const CMD_RESUME_UPDATE: u8 = b'R';

/// Longest accepted inbound line; anything longer is truncated.
const LINE_CAP: usize = 128;

/// Serial display driver. Implements [`HmiPanel`] for channel snapshots and
/// reads operator commands off the same wire.
pub struct Display<L: SerialLink> {
    link: L,
    timeout_ms: u64,
    paused: bool,
}

impl<L: SerialLink> Display<L> {
    pub fn new(link: L, timeout_ms: u64) -> Self {
        Self {
            link,
            timeout_ms,
            paused: false,
        }
    }

    /// True while the panel has paused outbound field updates.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Write one field assignment unless updates are paused.
    fn send_command(&mut self, command: &str) {
        if self.paused {
            return;
        }
        self.link.write_bytes(command.as_bytes());
        self.link.write_bytes(&[TERMINATOR; TERMINATOR_LEN]);
    }

    /// Send a command response back to the panel.
    ///
    /// Responses are replies the panel asked for, so they are not gated by
    /// the update pause. Framing mirrors USB: failures carry an `ERROR `
    /// prefix, and the terminator is sent when there is anything to say.
    pub fn send_response(&mut self, result: &CmdResult) {
        let (ok, body) = match result {
            Ok(body) => (true, body.clone()),
            Err(error) => (false, error.to_string()),
        };

        if !ok {
            self.link.write_bytes(b"ERROR ");
        }
        if !body.is_empty() {
            self.link.write_bytes(body.as_bytes());
        }
        if !ok || !body.is_empty() {
            self.link.write_bytes(&[TERMINATOR; TERMINATOR_LEN]);
        }
    }

    /// Read one inbound line if the panel has sent one.
    ///
    /// Returns `Some(line)` for operator commands. Internal pause/resume
    /// lines are consumed here and yield `None`. A line that does not
    /// complete within the serial timeout is discarded without surfacing
    /// an error.
    pub fn poll_line(&mut self, clock: &dyn Clock) -> Option<String> {
        if !self.link.readable() {
            return None;
        }

        let mut buf: HVec<u8, LINE_CAP> = HVec::new();
        let mut terminator_run = 0;
        let start_ms = clock.millis();

        loop {
            if clock.millis().saturating_sub(start_ms) >= self.timeout_ms {
                // Partial line: discard.
                return None;
            }
            let Some(byte) = self.link.read_byte() else {
                continue;
            };

            if byte == TERMINATOR {
                terminator_run += 1;
                if terminator_run == TERMINATOR_LEN {
                    break;
                }
            } else {
                terminator_run = 0;
                // Overflow truncates; the terminator scan keeps running.
                let _ = buf.push(byte);
            }
        }

        let line = core::str::from_utf8(&buf).ok()?;

        if let Some(internal) = line.strip_prefix(INTERNAL_PREAMBLE) {
            match internal.as_bytes().first() {
                Some(&CMD_PAUSE_UPDATE) => self.paused = true,
                Some(&CMD_RESUME_UPDATE) => self.paused = false,
                _ => {}
            }
            return None;
        }

        Some(line.to_string())
    }
}

impl<L: SerialLink> HmiPanel for Display<L> {
    fn push_text(&mut self, field: &str, text: &str) {
        self.send_command(&format!("{field}.txt=\"{text}\""));
    }

    fn push_value(&mut self, field: &str, value: i32) {
        self.send_command(&format!("{field}.val={value}"));
    }

    fn push_color(&mut self, field: &str, color: u32) {
        self.send_command(&format!("{field}.pco={color}"));
    }
}
