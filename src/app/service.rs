//! Station service — the cooperative-side owner of every channel.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!  ZeroCrossScheduler│  Station                     │
//!  (ISR, via shared  │   channels[0..N]             │──▶ HmiPanel
//!   handles)      ──▶│   heartbeat                  │
//!                    │   eval_command dispatch      │◀── USB / HMI lines
//!                    └──────────────────────────────┘
//!                              │
//!                              ▼ ByteStorage
//! ```
//!
//! The ISR never touches this struct: it works through the
//! [`ChannelShared`] handles and the heartbeat flag handed out before the
//! interrupt is armed.

use core::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::app::ports::{ByteStorage, HmiPanel};
use crate::channel::commands::CmdResult;
use crate::channel::{Channel, ChannelShared};
use crate::cli;
use crate::heartbeat::Heartbeat;

/// The channel collection and everything serviced from the main loop.
pub struct Station {
    channels: Vec<Channel>,
    heartbeat: Heartbeat,
}

impl Station {
    pub fn new(channels: Vec<Channel>, heartbeat: Heartbeat) -> Self {
        Self {
            channels,
            heartbeat,
        }
    }

    /// Initialise every channel: outputs LOW, stored records loaded (or
    /// factory defaults kept), PID state reset.
    pub fn init(&mut self, storage: &mut dyn ByteStorage) {
        for channel in &mut self.channels {
            channel.init(storage);
        }
    }

    /// Heartbeat flag for the zero-cross ISR.
    pub fn heartbeat_flag(&self) -> Arc<AtomicBool> {
        self.heartbeat.flag_handle()
    }

    /// ISR-side handles for the zero-cross scheduler, in channel order.
    pub fn shared_handles(&self) -> Vec<Arc<ChannelShared>> {
        self.channels.iter().map(Channel::shared_handle).collect()
    }

    /// One cooperative loop pass over the heartbeat and every channel.
    pub fn service(&mut self, now_us: u64, panel: &mut dyn HmiPanel) {
        self.heartbeat.service(now_us);
        for channel in &mut self.channels {
            channel.service(now_us, panel);
        }
    }

    /// Evaluate one `id:command:arg` line from any command origin.
    pub fn eval_command(&mut self, line: &str, storage: &mut dyn ByteStorage) -> CmdResult {
        cli::eval_command(line, &mut self.channels, storage)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }
}
