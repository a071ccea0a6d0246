//! Property tests for the two admission gates driven by a deterministic clock.

use std::sync::Arc;

use md_throttle::Clock;
use md_throttle::ManualClock;
use md_throttle::SlidingWindow;
use md_throttle::SymbolGate;
use proptest::prelude::*;

proptest! {
    #[test]
    fn frozen_clock_admits_exactly_min_of_calls_and_limit(
        limit in 1u32..200,
        calls in 1usize..500,
        start in 0u64..10_000_000u64,
    ) {
        let clock = Arc::new(ManualClock::new(start));
        let gate = SlidingWindow::builder().limit(limit).clock(clock).build();

        let admitted = (0..calls).filter(|_| gate.try_admit().is_ok()).count();

        prop_assert_eq!(admitted, calls.min(limit as usize));
        prop_assert_eq!(gate.window_hits(start), admitted as u32);
    }

    #[test]
    fn admitted_source_timestamps_strictly_increase(
        steps in prop::collection::vec((0u64..3_000u64, 0u64..5_000u64), 1..200),
    ) {
        let clock = Arc::new(ManualClock::new(0));
        let gate = SymbolGate::with_default_cooldown(clock.clone());
        let mut admitted = vec![];

        for (advance, source_ts) in steps {
            clock.advance(advance);
            if gate.try_admit("AAPL", source_ts).is_ok() {
                admitted.push(source_ts);
            }
        }

        prop_assert!(admitted.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn admissions_for_one_symbol_spaced_beyond_cooldown(
        steps in prop::collection::vec(0u64..1_500u64, 1..200),
    ) {
        let clock = Arc::new(ManualClock::new(0));
        let gate = SymbolGate::with_default_cooldown(clock.clone());
        let mut admit_times = vec![];
        let mut source_ts = 0_u64;

        for advance in steps {
            clock.advance(advance);
            source_ts += 1;
            if gate.try_admit("MSFT", source_ts).is_ok() {
                admit_times.push(clock.now_millis());
            }
        }

        prop_assert!(admit_times.windows(2).all(|pair| pair[1] - pair[0] > 1_000));
    }
}
