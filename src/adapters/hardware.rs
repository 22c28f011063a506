//! Channel hardware adapters: ADC inputs, heater/heartbeat outputs, stand
//! sense inputs, and the zero-cross interrupt wiring.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the adapters are thin wrappers over raw `esp_idf_svc::sys`
//! calls (oneshot ADC reads, direct GPIO register writes — the latter are
//! ISR-safe, which the heater drive requires). On the host they are
//! atomics-backed simulation objects that tests and the simulation loop can
//! poke from the outside.

use crate::app::ports::{AdcInput, DigitalOutput, StandSense};

// ═══════════════════════════════════════════════════════════════
//  Host simulation
// ═══════════════════════════════════════════════════════════════

#[cfg(not(target_os = "espidf"))]
pub use sim::{SimAdc, SimPin, SimStand};

#[cfg(not(target_os = "espidf"))]
mod sim {
    use super::*;
    use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};
    use std::sync::Arc;

    /// Simulated ADC input; the handle injects raw counts.
    pub struct SimAdc {
        counts: Arc<AtomicU16>,
    }

    impl SimAdc {
        pub fn new(initial_counts: u16) -> (Self, Arc<AtomicU16>) {
            let counts = Arc::new(AtomicU16::new(initial_counts));
            (
                Self {
                    counts: counts.clone(),
                },
                counts,
            )
        }
    }

    impl AdcInput for SimAdc {
        fn read_counts(&mut self) -> u16 {
            self.counts.load(Ordering::Relaxed)
        }
    }

    /// Simulated output pin; the handle observes the driven level.
    pub struct SimPin {
        level: Arc<AtomicBool>,
    }

    impl SimPin {
        pub fn new() -> (Self, Arc<AtomicBool>) {
            let level = Arc::new(AtomicBool::new(false));
            (
                Self {
                    level: level.clone(),
                },
                level,
            )
        }
    }

    impl DigitalOutput for SimPin {
        fn set(&self, high: bool) {
            self.level.store(high, Ordering::Relaxed);
        }
    }

    /// Simulated stand sensor; the handle rests or lifts the iron.
    pub struct SimStand {
        on_stand: Arc<AtomicBool>,
    }

    impl SimStand {
        pub fn new() -> (Self, Arc<AtomicBool>) {
            let on_stand = Arc::new(AtomicBool::new(false));
            (
                Self {
                    on_stand: on_stand.clone(),
                },
                on_stand,
            )
        }
    }

    impl StandSense for SimStand {
        fn on_stand(&self) -> bool {
            self.on_stand.load(Ordering::Relaxed)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  ESP-IDF
// ═══════════════════════════════════════════════════════════════

#[cfg(target_os = "espidf")]
pub use esp::{
    init_peripherals, install_zero_cross_isr, EspAdc, EspOutputPin, EspStandInput,
};

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;
    use crate::error::Error;
    use crate::pins;
    use crate::scheduler::ZeroCrossScheduler;
    use esp_idf_svc::sys::*;
    use log::info;
    use std::sync::{Arc, OnceLock};

    static ADC1_HANDLE: OnceLock<usize> = OnceLock::new();

    fn adc1_handle() -> adc_oneshot_unit_handle_t {
        *ADC1_HANDLE.get().unwrap_or(&0) as adc_oneshot_unit_handle_t
    }

    /// Configure ADC1, every channel GPIO, the heartbeat output and the
    /// zero-cross input. Call once from `main` before the loop starts.
    pub fn init_peripherals() -> Result<(), Error> {
        // SAFETY: called once from the single-threaded init path.
        unsafe {
            let init_cfg = adc_oneshot_unit_init_cfg_t {
                unit_id: adc_unit_t_ADC_UNIT_1,
                ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..Default::default()
            };
            let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
            if adc_oneshot_new_unit(&init_cfg, &mut handle) != ESP_OK {
                return Err(Error::Init("ADC1 unit init failed"));
            }
            let _ = ADC1_HANDLE.set(handle as usize);

            let chan_cfg = adc_oneshot_chan_cfg_t {
                atten: adc_atten_t_ADC_ATTEN_DB_12,
                bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            for channel in pins::CHANNEL_PINS {
                if adc_oneshot_config_channel(adc1_handle(), channel.tc_adc_channel, &chan_cfg)
                    != ESP_OK
                {
                    return Err(Error::Init("ADC1 channel config failed"));
                }
            }

            for channel in pins::CHANNEL_PINS {
                let out_cfg = gpio_config_t {
                    pin_bit_mask: 1u64 << channel.heater_gpio,
                    mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                    pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                    pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                    intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
                };
                if gpio_config(&out_cfg) != ESP_OK {
                    return Err(Error::Init("heater GPIO config failed"));
                }
                gpio_set_level(channel.heater_gpio, 0);

                let stand_cfg = gpio_config_t {
                    pin_bit_mask: 1u64 << channel.stand_gpio,
                    mode: gpio_mode_t_GPIO_MODE_INPUT,
                    pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
                    pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                    intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
                };
                if gpio_config(&stand_cfg) != ESP_OK {
                    return Err(Error::Init("stand GPIO config failed"));
                }
            }

            let hb_cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::HEARTBEAT_GPIO,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            if gpio_config(&hb_cfg) != ESP_OK {
                return Err(Error::Init("heartbeat GPIO config failed"));
            }

            let zc_cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pins::ZERO_CROSS_GPIO,
                mode: gpio_mode_t_GPIO_MODE_INPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
            };
            if gpio_config(&zc_cfg) != ESP_OK {
                return Err(Error::Init("zero-cross GPIO config failed"));
            }
        }

        info!("hardware: ADC1 and GPIO configured");
        Ok(())
    }

    /// Oneshot ADC read for one thermocouple input.
    pub struct EspAdc {
        channel: u32,
    }

    impl EspAdc {
        pub fn new(channel: u32) -> Self {
            Self { channel }
        }
    }

    impl AdcInput for EspAdc {
        fn read_counts(&mut self) -> u16 {
            let mut raw: i32 = 0;
            // SAFETY: ADC1 was configured during init_peripherals; reads
            // happen from the cooperative loop only.
            let ret = unsafe { adc_oneshot_read(adc1_handle(), self.channel, &mut raw) };
            if ret != ESP_OK {
                return 0;
            }
            raw.max(0) as u16
        }
    }

    /// Direct-register GPIO output. ISR-safe.
    pub struct EspOutputPin {
        gpio: i32,
    }

    impl EspOutputPin {
        pub fn new(gpio: i32) -> Self {
            Self { gpio }
        }
    }

    impl DigitalOutput for EspOutputPin {
        fn set(&self, high: bool) {
            // SAFETY: gpio_set_level is a single register write on an
            // already-configured output pin; safe from ISR context.
            unsafe {
                gpio_set_level(self.gpio, if high { 1 } else { 0 });
            }
        }
    }

    /// Stand sensor input. The wiring is LOW = iron on stand.
    pub struct EspStandInput {
        gpio: i32,
    }

    impl EspStandInput {
        pub fn new(gpio: i32) -> Self {
            Self { gpio }
        }
    }

    impl StandSense for EspStandInput {
        fn on_stand(&self) -> bool {
            // SAFETY: read-only register access on a configured input.
            (unsafe { gpio_get_level(self.gpio) }) == 0
        }
    }

    static SCHEDULER: OnceLock<Arc<ZeroCrossScheduler>> = OnceLock::new();

    unsafe extern "C" fn zero_cross_isr(_arg: *mut core::ffi::c_void) {
        // SAFETY: esp_timer_get_time is an ISR-safe counter read.
        let now_us = (unsafe { esp_timer_get_time() }) as u64;
        if let Some(scheduler) = SCHEDULER.get() {
            scheduler.on_zero_cross(now_us);
        }
    }

    /// Attach the burst-firing scheduler to the zero-cross edge interrupt.
    pub fn install_zero_cross_isr(scheduler: Arc<ZeroCrossScheduler>) -> Result<(), Error> {
        if SCHEDULER.set(scheduler).is_err() {
            return Err(Error::Init("zero-cross ISR already installed"));
        }

        // SAFETY: gpio_install_isr_service is idempotent;
        // ESP_ERR_INVALID_STATE means it was installed already.
        unsafe {
            let ret = gpio_install_isr_service(0);
            if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
                return Err(Error::Init("GPIO ISR service install failed"));
            }
            gpio_isr_handler_add(
                pins::ZERO_CROSS_GPIO,
                Some(zero_cross_isr),
                core::ptr::null_mut(),
            );
            gpio_intr_enable(pins::ZERO_CROSS_GPIO);
        }

        info!("hardware: zero-cross ISR armed");
        Ok(())
    }
}
