//! Serial link adapters.
//!
//! - **ESP-IDF** — a UART driver wrapper for the HMI panel link. The USB
//!   command console rides the CDC console (stdin/stdout through the VFS),
//!   same as the host path.
//! - **host** — a stdin/stdout link so the simulation loop can be driven
//!   interactively with the same `id:command:arg` lines.

use crate::app::ports::SerialLink;

// ═══════════════════════════════════════════════════════════════
//  Console link (host and CDC console)
// ═══════════════════════════════════════════════════════════════

pub use console::ConsoleLink;

mod console {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::sync::mpsc::{self, Receiver, TryRecvError};

    /// stdin/stdout as a [`SerialLink`].
    ///
    /// A detached reader thread pumps stdin bytes into a channel so the
    /// cooperative loop never blocks on the console.
    pub struct ConsoleLink {
        rx: Receiver<u8>,
        pending: VecDeque<u8>,
    }

    impl ConsoleLink {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                let mut stdin = std::io::stdin();
                let mut byte = [0u8; 1];
                while stdin.read_exact(&mut byte).is_ok() {
                    if tx.send(byte[0]).is_err() {
                        break;
                    }
                }
            });
            Self {
                rx,
                pending: VecDeque::new(),
            }
        }

        fn pump(&mut self) {
            loop {
                match self.rx.try_recv() {
                    Ok(byte) => self.pending.push_back(byte),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }
    }

    impl Default for ConsoleLink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SerialLink for ConsoleLink {
        fn readable(&mut self) -> bool {
            self.pump();
            !self.pending.is_empty()
        }

        fn read_byte(&mut self) -> Option<u8> {
            self.pump();
            self.pending.pop_front()
        }

        fn write_bytes(&mut self, bytes: &[u8]) {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(bytes);
            let _ = stdout.flush();
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF UART (HMI panel)
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
pub use uart::UartLink;

#[cfg(target_os = "espidf")]
mod uart {
    use super::*;
    use esp_idf_svc::sys::*;
    use log::info;

    const RX_BUFFER: i32 = 512;

    /// One UART port as a [`SerialLink`].
    pub struct UartLink {
        port: uart_port_t,
    }

    impl UartLink {
        /// Install the UART driver and bind the pins.
        pub fn new(port: uart_port_t, tx_gpio: i32, rx_gpio: i32, baud: u32) -> Self {
            // SAFETY: called once from the init path; the port number and
            // pins come from the board map.
            unsafe {
                let config = uart_config_t {
                    baud_rate: baud as i32,
                    data_bits: uart_word_length_t_UART_DATA_8_BITS,
                    parity: uart_parity_t_UART_PARITY_DISABLE,
                    stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
                    flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
                    ..Default::default()
                };
                uart_param_config(port, &config);
                uart_set_pin(
                    port,
                    tx_gpio,
                    rx_gpio,
                    UART_PIN_NO_CHANGE,
                    UART_PIN_NO_CHANGE,
                );
                uart_driver_install(port, RX_BUFFER, 0, 0, core::ptr::null_mut(), 0);
            }

            info!("uart{port}: installed at {baud} baud");
            Self { port }
        }
    }

    impl SerialLink for UartLink {
        fn readable(&mut self) -> bool {
            let mut waiting: usize = 0;
            // SAFETY: driver installed in the constructor.
            unsafe {
                uart_get_buffered_data_len(self.port, &mut waiting);
            }
            waiting > 0
        }

        fn read_byte(&mut self) -> Option<u8> {
            let mut byte = [0u8; 1];
            // Zero-tick timeout: return immediately when the FIFO is empty.
            let got = unsafe {
                uart_read_bytes(self.port, byte.as_mut_ptr() as *mut _, 1, 0)
            };
            (got == 1).then_some(byte[0])
        }

        fn write_bytes(&mut self, bytes: &[u8]) {
            // SAFETY: driver installed in the constructor.
            unsafe {
                uart_write_bytes(self.port, bytes.as_ptr() as *const _, bytes.len());
            }
        }
    }
}
