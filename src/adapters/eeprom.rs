//! I²C configuration EEPROM (24C16-class) behind the [`ByteStorage`] port.
//!
//! The 24C16 maps its 2 KiB address space across eight consecutive I²C
//! device addresses: the high three address bits select the device, the low
//! eight travel as the register byte. Writes are acknowledged only after the
//! internal write cycle finishes, so every write is followed by ACK polling
//! with a bounded (7 ms) timeout; the poll is the only blocking wait in the
//! whole storage path and runs in the cooperative loop only.
//!
//! Only built for ESP-IDF targets. Host code and tests use
//! [`MemStorage`](super::mem_storage::MemStorage) instead.

#[cfg(target_os = "espidf")]
pub use esp::EepromStorage;

#[cfg(target_os = "espidf")]
mod esp {
    use crate::app::ports::ByteStorage;
    use crate::error::StorageError;
    use esp_idf_svc::hal::delay::BLOCK;
    use esp_idf_svc::hal::i2c::I2cDriver;
    use std::time::{Duration, Instant};

    /// Total device size in bytes.
    const DEVICE_SIZE: usize = 2048;
    /// Write page size; a single write transaction may not cross a page.
    const WRITE_PAGE: usize = 16;
    /// Largest read chunk per transaction.
    const READ_CHUNK: usize = 32;

    pub struct EepromStorage<'d> {
        i2c: I2cDriver<'d>,
        base_addr: u8,
        ack_timeout: Duration,
    }

    impl<'d> EepromStorage<'d> {
        pub fn new(i2c: I2cDriver<'d>, base_addr: u8, ack_timeout_ms: u64) -> Self {
            Self {
                i2c,
                base_addr,
                ack_timeout: Duration::from_millis(ack_timeout_ms),
            }
        }

        /// Device address for a memory address (high bits select the bank).
        fn device_addr(&self, mem_addr: usize) -> u8 {
            self.base_addr | ((mem_addr >> 8) & 0x07) as u8
        }

        /// Poll until the device ACKs again after a write cycle.
        fn ack_poll(&mut self, device: u8) -> Result<(), StorageError> {
            let start = Instant::now();
            while start.elapsed() < self.ack_timeout {
                if self.i2c.write(device, &[], BLOCK).is_ok() {
                    return Ok(());
                }
            }
            Err(StorageError::Timeout)
        }

        fn write_chunk(&mut self, mem_addr: usize, data: &[u8]) -> Result<(), StorageError> {
            let device = self.device_addr(mem_addr);
            let mut frame = [0u8; WRITE_PAGE + 1];
            frame[0] = (mem_addr & 0xFF) as u8;
            frame[1..=data.len()].copy_from_slice(data);

            self.i2c
                .write(device, &frame[..=data.len()], BLOCK)
                .map_err(|_| StorageError::Nack)?;
            self.ack_poll(device)
        }
    }

    impl ByteStorage for EepromStorage<'_> {
        fn read_byte(&mut self, addr: usize) -> Result<u8, StorageError> {
            let mut buf = [0u8; 1];
            self.read_bytes(addr, &mut buf)?;
            Ok(buf[0])
        }

        fn write_byte(&mut self, addr: usize, data: u8) -> Result<(), StorageError> {
            self.write_bytes(addr, &[data])
        }

        fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
            if addr + buf.len() > DEVICE_SIZE {
                return Err(StorageError::OutOfBounds);
            }

            let mut addr = addr;
            for chunk in buf.chunks_mut(READ_CHUNK) {
                let device = self.device_addr(addr);
                let reg = [(addr & 0xFF) as u8];
                self.i2c
                    .write_read(device, &reg, chunk, BLOCK)
                    .map_err(|_| StorageError::Nack)?;
                addr += chunk.len();
            }
            Ok(())
        }

        fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
            if addr + data.len() > DEVICE_SIZE {
                return Err(StorageError::OutOfBounds);
            }

            let mut addr = addr;
            let mut data = data;
            while !data.is_empty() {
                // Stay inside the current write page.
                let page_room = WRITE_PAGE - (addr % WRITE_PAGE);
                let take = page_room.min(data.len());
                self.write_chunk(addr, &data[..take])?;
                addr += take;
                data = &data[take..];
            }
            Ok(())
        }
    }
}
