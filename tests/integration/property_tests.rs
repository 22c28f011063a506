//! Randomised whole-station invariant checks.
//!
//! Drives the mock station through arbitrary interleavings of zero-cross
//! ticks, loop passes, operator commands and tip changes, asserting the
//! electrical invariants after every step:
//!
//! - the PID output never leaves [0, 1],
//! - the heater is never HIGH while a sample window is open,
//! - the heater is never HIGH while the channel is disabled.

use proptest::prelude::*;

use crate::mock_hw::StationHarness;

#[derive(Debug, Clone)]
enum Action {
    ZeroCross,
    LoopPass { advance_us: u64 },
    Enable(bool),
    TipCounts(u16),
    Stand(bool),
    Command(usize),
}

/// A small pool of mutating commands to interleave.
const COMMANDS: &[&str] = &[
    "0:set_t:350",
    "0:set_uv:8000",
    "0:pid_kp:2",
    "0:pid_ki:0.5",
    "0:pid_kd:0.01",
    "0:pid_d_tau:0.25",
    "0:sleep_delay:50",
    "0:sleep_set_t:150",
    "0:runaway_t:460",
];

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        5 => Just(Action::ZeroCross),
        5 => (0u64..20_000).prop_map(|advance_us| Action::LoopPass { advance_us }),
        1 => any::<bool>().prop_map(Action::Enable),
        2 => (0u16..4096).prop_map(Action::TipCounts),
        1 => any::<bool>().prop_map(Action::Stand),
        2 => (0..COMMANDS.len()).prop_map(Action::Command),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn electrical_invariants_hold_under_arbitrary_interleaving(
        actions in proptest::collection::vec(arb_action(), 1..200),
    ) {
        let mut hw = StationHarness::new(1);

        for action in actions {
            match action {
                Action::ZeroCross => hw.tick_half_cycle(),
                Action::LoopPass { advance_us } => {
                    hw.advance_us(advance_us);
                    hw.run_loop();
                }
                Action::Enable(on) => {
                    let line = if on { "0:en:1" } else { "0:en:0" };
                    prop_assert!(hw.eval(line).is_ok());
                }
                Action::TipCounts(counts) => {
                    hw.adc[0].store(counts, core::sync::atomic::Ordering::Relaxed);
                }
                Action::Stand(rested) => hw.rest_iron(0, rested),
                Action::Command(index) => {
                    // Commands may fail validation; they must never panic.
                    let _ = hw.eval(COMMANDS[index]);
                }
            }

            let shared = &hw.station.shared_handles()[0];
            let output = shared.output();
            prop_assert!((0.0..=1.0).contains(&output), "output {output} out of range");

            if hw.heater_high(0) {
                prop_assert!(shared.is_enabled(), "heater HIGH while disabled");
                prop_assert!(!shared.sample_scheduled(), "heater HIGH inside sample window");
            }
        }
    }

    #[test]
    fn record_round_trip_is_bit_exact(
        kp in 0.0f32..100.0,
        ki in 0.0f32..100.0,
        kd in 0.0f32..10.0,
        tau in 0.0f32..2.0,
        delay_ms in 0.0f32..120_000.0,
    ) {
        let mut hw = StationHarness::new(1);
        {
            let channel = &mut hw.station.channels_mut()[0];
            channel.pid_mut().kp = kp;
            channel.pid_mut().ki = ki;
            channel.pid_mut().kd = kd;
            channel.pid_mut().derivative_tau = tau;
            channel.set_sleep_delay_ms(delay_ms);
        }
        prop_assert!(hw.station.channels_mut()[0].save(&mut hw.storage));

        let mut fresh = StationHarness::new(1);
        std::mem::swap(&mut fresh.storage, &mut hw.storage);
        let mut storage = std::mem::replace(
            &mut fresh.storage,
            ironstation::adapters::mem_storage::MemStorage::new(1),
        );
        prop_assert!(fresh.station.channels_mut()[0].load(&mut storage));
        fresh.storage = storage;

        let channel = &fresh.station.channels()[0];
        prop_assert_eq!(channel.pid().kp.to_bits(), kp.to_bits());
        prop_assert_eq!(channel.pid().ki.to_bits(), ki.to_bits());
        prop_assert_eq!(channel.pid().kd.to_bits(), kd.to_bits());
        prop_assert_eq!(channel.pid().derivative_tau.to_bits(), tau.to_bits());
        prop_assert_eq!(channel.sleep_delay_ms().to_bits(), delay_ms.to_bits());
    }
}
