//! Mock hardware harness for integration tests.
//!
//! Builds a full station (channels, scheduler, heartbeat, storage) on the
//! simulation adapters and exposes the injection handles, plus a recording
//! HMI panel so tests can assert on the exact field writes.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;

use ironstation::adapters::hardware::{SimAdc, SimPin, SimStand};
use ironstation::adapters::mem_storage::MemStorage;
use ironstation::app::ports::HmiPanel;
use ironstation::app::service::Station;
use ironstation::channel::commands::CmdResult;
use ironstation::channel::hmi::STOCK_BINDINGS;
use ironstation::channel::persist::RECORD_FOOTPRINT;
use ironstation::channel::{Channel, ChannelIo};
use ironstation::config::{StationConfig, ADC_RESOLUTION, ADC_VREF};
use ironstation::heartbeat::Heartbeat;
use ironstation::scheduler::ZeroCrossScheduler;

/// Amplifier gain used for every harness channel.
pub const GAIN: f32 = 200.0;

/// Mains half-cycle at 50 Hz.
pub const HALF_CYCLE_US: u64 = 10_000;

/// µV at the tip → raw ADC counts for the harness gain.
pub fn counts_for_uv(uv: f32) -> u16 {
    (uv * 1e-6 * GAIN / ADC_VREF * ADC_RESOLUTION) as u16
}

// ── Recording HMI panel ───────────────────────────────────────

#[derive(Default)]
pub struct RecordingPanel {
    pub writes: Vec<String>,
}

impl HmiPanel for RecordingPanel {
    fn push_text(&mut self, field: &str, text: &str) {
        self.writes.push(format!("{field}.txt={text}"));
    }
    fn push_value(&mut self, field: &str, value: i32) {
        self.writes.push(format!("{field}.val={value}"));
    }
    fn push_color(&mut self, field: &str, color: u32) {
        self.writes.push(format!("{field}.pco={color}"));
    }
}

// ── Station harness ───────────────────────────────────────────

pub struct StationHarness {
    pub station: Station,
    pub scheduler: ZeroCrossScheduler,
    pub storage: MemStorage,
    pub panel: RecordingPanel,

    pub adc: Vec<Arc<AtomicU16>>,
    pub heater: Vec<Arc<AtomicBool>>,
    pub stand: Vec<Arc<AtomicBool>>,
    pub heartbeat_level: Arc<AtomicBool>,

    pub now_us: u64,
}

impl StationHarness {
    pub fn new(channel_count: usize) -> Self {
        let config = StationConfig::default();

        let mut adc_handles = Vec::new();
        let mut heater_handles = Vec::new();
        let mut stand_handles = Vec::new();

        let channels: Vec<Channel> = (0..channel_count)
            .map(|index| {
                let (adc, adc_handle) = SimAdc::new(0);
                let (heater, heater_handle) = SimPin::new();
                let (stand, stand_handle) = SimStand::new();
                adc_handles.push(adc_handle);
                heater_handles.push(heater_handle);
                stand_handles.push(stand_handle);

                Channel::new(
                    index,
                    ChannelIo {
                        adc: Box::new(adc),
                        heater: Box::new(heater),
                        stand: Box::new(stand),
                    },
                    GAIN,
                    index * RECORD_FOOTPRINT,
                    STOCK_BINDINGS[index % STOCK_BINDINGS.len()],
                    &config,
                )
            })
            .collect();

        let (hb_pin, heartbeat_level) = SimPin::new();
        let heartbeat = Heartbeat::new(Box::new(hb_pin), config.heartbeat_pulse_us);

        let mut station = Station::new(channels, heartbeat);
        let mut storage = MemStorage::new(channel_count * RECORD_FOOTPRINT);
        station.init(&mut storage);

        let scheduler = ZeroCrossScheduler::new(
            station.shared_handles(),
            station.heartbeat_flag(),
            config.zero_cross_period,
        );

        Self {
            station,
            scheduler,
            storage,
            panel: RecordingPanel::default(),
            adc: adc_handles,
            heater: heater_handles,
            stand: stand_handles,
            heartbeat_level,
            now_us: 0,
        }
    }

    /// Inject a tip voltage (µV) on one channel's ADC.
    pub fn set_tip_uv(&self, channel: usize, uv: f32) {
        self.adc[channel].store(counts_for_uv(uv), Ordering::Relaxed);
    }

    pub fn heater_high(&self, channel: usize) -> bool {
        self.heater[channel].load(Ordering::Relaxed)
    }

    pub fn rest_iron(&self, channel: usize, on_stand: bool) {
        self.stand[channel].store(on_stand, Ordering::Relaxed);
    }

    /// One zero-cross tick at the current simulated time. The caller
    /// advances time separately.
    pub fn zero_cross_now(&mut self) {
        self.scheduler.on_zero_cross(self.now_us);
    }

    /// One zero-cross tick followed by one half-cycle of simulated time.
    pub fn tick_half_cycle(&mut self) {
        self.zero_cross_now();
        self.advance_us(HALF_CYCLE_US);
    }

    /// One cooperative loop pass at the current simulated time.
    pub fn run_loop(&mut self) {
        self.station.service(self.now_us, &mut self.panel);
    }

    /// Advance simulated time without ticking anything.
    pub fn advance_us(&mut self, us: u64) {
        self.now_us += us;
    }

    pub fn eval(&mut self, line: &str) -> CmdResult {
        self.station.eval_command(line, &mut self.storage)
    }

    /// Run a full sample window: zero-cross ticks up to the sample slot,
    /// then a loop pass after the amplifier recovery.
    pub fn run_sample_cycle(&mut self) {
        // Firing ticks k = 0..N-1, then the sample slot.
        for _ in 0..=10 {
            self.tick_half_cycle();
        }
        // Amplifier recovered long ago (a whole half-cycle); acquire.
        self.advance_us(2000);
        self.run_loop();
    }

    /// Warm up past the retaken first sample so subsequent cycles behave
    /// like steady state.
    pub fn warm_up(&mut self) {
        self.run_sample_cycle();
        self.advance_us(2000);
        self.run_loop();
    }
}
