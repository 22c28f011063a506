//! Soldering station firmware — main entry point.
//!
//! Wires the adapters to the control core and runs the cooperative loop.
//! On ESP-IDF this arms the real zero-cross interrupt; on the host it runs
//! a timing simulation so the full command surface and control path can be
//! exercised from a terminal.

#![deny(unused_must_use)]

use anyhow::Result;

use ironstation::adapters::serial::ConsoleLink;
use ironstation::adapters::time::TimeAdapter;
use ironstation::app::ports::Clock;
use ironstation::app::service::Station;
use ironstation::channel::hmi::STOCK_BINDINGS;
use ironstation::channel::{Channel, ChannelIo};
use ironstation::cli::{self, LineReader};
use ironstation::config::StationConfig;
use ironstation::heartbeat::Heartbeat;
use ironstation::pins;
use ironstation::scheduler::ZeroCrossScheduler;

fn main() -> Result<()> {
    #[cfg(target_os = "espidf")]
    {
        run_firmware()
    }

    #[cfg(not(target_os = "espidf"))]
    {
        run_simulation()
    }
}

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF firmware
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
fn run_firmware() -> Result<()> {
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::units::Hertz;
    use ironstation::adapters::eeprom::EepromStorage;
    use ironstation::adapters::hardware::{
        init_peripherals, install_zero_cross_isr, EspAdc, EspOutputPin, EspStandInput,
    };
    use ironstation::adapters::serial::UartLink;
    use ironstation::hmi::Display;
    use log::info;
    use std::sync::Arc;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let config = StationConfig::default();

    info!("ironstation v{} starting", env!("CARGO_PKG_VERSION"));

    init_peripherals()?;

    // ── Persistent storage ────────────────────────────────────
    let peripherals = Peripherals::take().map_err(|_| anyhow::anyhow!("peripherals taken"))?;
    let i2c_config = I2cConfig::new().baudrate(Hertz(100_000).into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio14,
        peripherals.pins.gpio15,
        &i2c_config,
    )?;
    let mut storage =
        EepromStorage::new(i2c, pins::EEPROM_I2C_ADDR, config.storage_ack_timeout_ms);

    // ── Channels ──────────────────────────────────────────────
    let channels: Vec<Channel> = pins::CHANNEL_PINS
        .iter()
        .enumerate()
        .map(|(index, board)| {
            let io = ChannelIo {
                adc: Box::new(EspAdc::new(board.tc_adc_channel)),
                heater: Box::new(EspOutputPin::new(board.heater_gpio)),
                stand: Box::new(EspStandInput::new(board.stand_gpio)),
            };
            Channel::new(
                index,
                io,
                board.tc_gain,
                board.storage_base,
                STOCK_BINDINGS[index],
                &config,
            )
        })
        .collect();

    let heartbeat = Heartbeat::new(
        Box::new(EspOutputPin::new(pins::HEARTBEAT_GPIO)),
        config.heartbeat_pulse_us,
    );

    let mut station = Station::new(channels, heartbeat);
    station.init(&mut storage);

    // ── Zero-cross interrupt ──────────────────────────────────
    let scheduler = Arc::new(ZeroCrossScheduler::new(
        station.shared_handles(),
        station.heartbeat_flag(),
        config.zero_cross_period,
    ));
    install_zero_cross_isr(scheduler)?;

    // ── Interfaces ────────────────────────────────────────────
    let mut display = Display::new(
        UartLink::new(
            esp_idf_svc::sys::uart_port_t_UART_NUM_1,
            pins::HMI_UART_TX_GPIO,
            pins::HMI_UART_RX_GPIO,
            config.hmi_baud,
        ),
        config.serial_timeout_ms,
    );
    let mut usb = ConsoleLink::new();
    let mut usb_reader = LineReader::new();

    let clock = TimeAdapter::new();
    info!("station ready, entering control loop");

    loop {
        station.service(clock.micros(), &mut display);

        if let Some(line) = usb_reader.poll(&mut usb) {
            let result = station.eval_command(&line, &mut storage);
            cli::respond(&mut usb, &result);
        }

        if let Some(line) = display.poll_line(&clock) {
            let result = station.eval_command(&line, &mut storage);
            display.send_response(&result);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Host simulation
// ═══════════════════════════════════════════════════════════════

#[cfg(not(target_os = "espidf"))]
fn run_simulation() -> Result<()> {
    use ironstation::adapters::hardware::{SimAdc, SimPin, SimStand};
    use ironstation::adapters::mem_storage::MemStorage;
    use ironstation::app::ports::HmiPanel;
    use ironstation::channel::persist::RECORD_FOOTPRINT;
    use std::sync::Arc;

    /// Discards snapshots; the simulation has no panel attached.
    struct NullPanel;

    impl HmiPanel for NullPanel {
        fn push_text(&mut self, _field: &str, _text: &str) {}
        fn push_value(&mut self, _field: &str, _value: i32) {}
        fn push_color(&mut self, _field: &str, _color: u32) {}
    }

    let config = StationConfig::default();
    let mut storage = MemStorage::new(RECORD_FOOTPRINT * pins::CHANNEL_PINS.len());

    let channels: Vec<Channel> = pins::CHANNEL_PINS
        .iter()
        .enumerate()
        .map(|(index, board)| {
            // A quiet tip a little above ambient.
            let (adc, _counts) = SimAdc::new(40);
            let (heater, _level) = SimPin::new();
            let (stand, _rest) = SimStand::new();
            let io = ChannelIo {
                adc: Box::new(adc),
                heater: Box::new(heater),
                stand: Box::new(stand),
            };
            Channel::new(
                index,
                io,
                board.tc_gain,
                board.storage_base,
                STOCK_BINDINGS[index],
                &config,
            )
        })
        .collect();

    let (hb_pin, _hb_level) = SimPin::new();
    let heartbeat = Heartbeat::new(Box::new(hb_pin), config.heartbeat_pulse_us);

    let mut station = Station::new(channels, heartbeat);
    station.init(&mut storage);

    let scheduler = Arc::new(ZeroCrossScheduler::new(
        station.shared_handles(),
        station.heartbeat_flag(),
        config.zero_cross_period,
    ));

    let mut console = ConsoleLink::new();
    let mut reader = LineReader::new();
    let clock = TimeAdapter::new();

    println!(
        "ironstation v{} simulation — {} channels, commands as id:command:value_or_?",
        env!("CARGO_PKG_VERSION"),
        pins::CHANNEL_PINS.len()
    );

    // Mains half-cycle at 50 Hz.
    const HALF_CYCLE_US: u64 = 10_000;
    let mut next_zero_cross_us = 0u64;
    let mut panel = NullPanel;

    loop {
        let now_us = clock.micros();

        // Stand-in for the zero-cross interrupt.
        while now_us >= next_zero_cross_us {
            scheduler.on_zero_cross(next_zero_cross_us);
            next_zero_cross_us += HALF_CYCLE_US;
        }

        station.service(now_us, &mut panel);

        if let Some(line) = reader.poll(&mut console) {
            let result = station.eval_command(&line, &mut storage);
            cli::respond(&mut console, &result);
        }

        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}
