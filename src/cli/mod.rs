//! Line-oriented command surface.
//!
//! Every line is `id:command:arg`, where `id` is a single decimal digit
//! selecting a channel, and `arg` is either `?` (get) or a textual value
//! (set). The same parser serves USB (newline-terminated) and the HMI link
//! (0xFF-terminated); only the framing differs.
//!
//! Dispatch is a flat table from command name to a typed handler:
//!
//! ```text
//!  "0:set_t:350" ──▶ eval_command ──▶ COMMAND_TABLE["set_t"] ──▶
//!                     channel::commands::temp_set(&mut channels[0], "350")
//! ```

use crate::app::ports::{ByteStorage, SerialLink};
use crate::channel::commands::{self, CmdResult};
use crate::channel::Channel;
use crate::error::CommandError;

/// A command handler: `(channel, arg, storage) -> Result<body, error>`.
pub type CommandFn = fn(&mut Channel, &str, &mut dyn ByteStorage) -> CmdResult;

/// One row of the dispatch table.
pub struct CommandHandler {
    pub name: &'static str,
    pub run: CommandFn,
}

/// All recognized commands.
pub const COMMAND_TABLE: &[CommandHandler] = &[
    CommandHandler { name: "en", run: commands::enable },
    CommandHandler { name: "set_t", run: commands::temp_set },
    CommandHandler { name: "meas_t", run: commands::temp_measure },
    CommandHandler { name: "meas_uv", run: commands::tc_read_voltage },
    CommandHandler { name: "sleep_state", run: commands::sleep_state },
    CommandHandler { name: "pid_op", run: commands::pid_output },
    CommandHandler { name: "runaway_t", run: commands::temp_runaway_threshold },
    CommandHandler { name: "set_min_t", run: commands::temp_set_min },
    CommandHandler { name: "set_max_t", run: commands::temp_set_max },
    CommandHandler { name: "set_uv", run: commands::voltage_setpoint },
    CommandHandler { name: "pid_kp", run: commands::pid_kp },
    CommandHandler { name: "pid_ki", run: commands::pid_ki },
    CommandHandler { name: "pid_kd", run: commands::pid_kd },
    CommandHandler { name: "pid_d_tau", run: commands::pid_derivative_tau },
    CommandHandler { name: "sleep_set_t", run: commands::sleep_temp },
    CommandHandler { name: "sleep_delay", run: commands::sleep_delay },
    CommandHandler { name: "tc_cal_table", run: commands::cal_table },
    CommandHandler { name: "restore", run: commands::restore_defaults },
];

/// Evaluate one command line against the channel collection.
///
/// Failures come back as a [`CommandError`] whose `Display` body the
/// transport prefixes with `ERROR `. No channel state is mutated on a
/// parse failure.
pub fn eval_command(
    line: &str,
    channels: &mut [Channel],
    storage: &mut dyn ByteStorage,
) -> CmdResult {
    let Some(c1) = line.find(':') else {
        return Err(CommandError::Malformed);
    };
    let Some(c2) = line[c1 + 1..].find(':').map(|i| i + c1 + 1) else {
        return Err(CommandError::Malformed);
    };

    let id = line
        .chars()
        .next()
        .filter(|c| c.is_ascii_digit())
        .map(|c| c as usize - '0' as usize)
        .filter(|&id| id < channels.len());
    let Some(id) = id else {
        return Err(CommandError::InvalidDeviceId);
    };

    let command = &line[c1 + 1..c2];
    let arg = &line[c2 + 1..];

    for handler in COMMAND_TABLE {
        if handler.name == command {
            return (handler.run)(&mut channels[id], arg, storage);
        }
    }

    Err(CommandError::UnknownCommand)
}

// ───────────────────────────────────────────────────────────────
// Newline-framed console transport
// ───────────────────────────────────────────────────────────────

/// Longest accepted console line; longer input is truncated.
const LINE_CAP: usize = 128;

/// Accumulates bytes from a newline-terminated link into command lines.
/// A trailing carriage return is stripped for terminals sending CRLF.
#[derive(Default)]
pub struct LineReader {
    buf: Vec<u8>,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain available bytes; returns a line once a newline arrives.
    pub fn poll(&mut self, link: &mut dyn SerialLink) -> Option<String> {
        while let Some(byte) = link.read_byte() {
            if byte == b'\n' {
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                return Some(line);
            }
            if self.buf.len() < LINE_CAP {
                self.buf.push(byte);
            }
        }
        None
    }
}

/// Write a command response over a newline-framed link: failures carry the
/// `ERROR ` prefix, and the terminator goes out whenever there is a body or
/// a failure to report.
pub fn respond(link: &mut dyn SerialLink, result: &CmdResult) {
    let (ok, body) = match result {
        Ok(body) => (true, body.clone()),
        Err(error) => (false, error.to_string()),
    };

    if !ok {
        link.write_bytes(b"ERROR ");
    }
    if !body.is_empty() {
        link.write_bytes(body.as_bytes());
    }
    if !ok || !body.is_empty() {
        link.write_bytes(b"\n");
    }
}
