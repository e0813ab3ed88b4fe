//! Adversarial property-based suite for the decay stream.
//!
//! Randomized activities, durations, emission offsets and seeds try to break
//! the windowing invariants:
//! - re-based times in `[0, duration)`, sorted within a window
//! - no particle emitted twice
//! - lower edges never go backwards
//! - pending particles never precede the last emitted window
//! - identical seeds give identical streams

use std::collections::HashSet;

use proptest::prelude::*;

use hifreq_core::error::ErrorKind;
use hifreq_core::properties::Properties;
use hifreq_stream::DecayStreamEngine;
use hifreq_tests::helpers::*;

fn activity_text(bq: f64) -> String {
    format!("{bq} Bq")
}

fn duration_text(s: f64) -> String {
    format!("{s} s")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn windowing_invariants_hold(
        seed in any::<u64>(),
        activity in 1.0f64..5.0e3,
        duration in 1.0e-4f64..1.0e-1,
        offsets in prop::collection::vec(0.0f64..0.2, 0..4),
        n in 1usize..40,
    ) {
        // keep the per-window load bounded
        prop_assume!(activity * duration < 200.0);
        let (mut engine, _) = make_engine(
            offsets.clone(),
            &activity_text(activity),
            &duration_text(duration),
            seed,
        );
        let duration = engine.readout_window_duration().expect("initialized");
        let mut seen = HashSet::new();
        let mut last_upper = f64::NEG_INFINITY;
        for _ in 0..n {
            let w = engine.load_next(false).expect("window");
            prop_assert!(w.time >= last_upper);
            for pair in w.particles.windows(2) {
                prop_assert!(pair[0].time <= pair[1].time);
            }
            for p in &w.particles {
                prop_assert!(p.time >= 0.0 && p.time < duration);
                prop_assert!(p.has_vertex());
                prop_assert!(seen.insert(p.track_id.expect("track id")));
            }
            last_upper = w.time + duration;
            prop_assert_eq!(engine.current_time(), Some(last_upper));
        }
        // the warm-up only sees decays when it samples at least one
        let activity = engine.activity().expect("initialized");
        if (100.0 * activity * duration).floor() >= 1.0 {
            let max_offset = offsets.iter().copied().fold(0.0, f64::max);
            prop_assert_eq!(engine.max_delay_time(), Some(max_offset));
        } else {
            prop_assert_eq!(engine.max_delay_time(), Some(0.0));
        }
    }

    #[test]
    fn identical_seeds_identical_streams(
        seed in any::<u64>(),
        offsets in prop::collection::vec(0.0f64..5.0e-3, 1..4),
    ) {
        let (mut a, _) = make_engine(offsets.clone(), "2 kBq", "1 ms", seed);
        let (mut b, _) = make_engine(offsets, "2 kBq", "1 ms", seed);
        for _ in 0..20 {
            prop_assert_eq!(a.next_window().expect("a"), b.next_window().expect("b"));
        }
    }

    #[test]
    fn garbage_quantities_are_configuration_errors(
        text in "[a-zA-Z0-9 .+-]{0,12}",
    ) {
        let (reg, _) = decay_registry(vec![0.0]);
        let mut engine = DecayStreamEngine::new("hifreq", vertex_provider());
        let cfg = Properties::new()
            .with("activity", text.as_str())
            .with("duration", "1 ms")
            .with("event_generator_name", DECAY_NAME)
            .with("seed", 1_i64);
        match engine.initialize(&cfg, &reg) {
            Ok(()) => {
                let a = engine.activity().expect("initialized");
                prop_assert!(a.is_finite() && a > 0.0);
            }
            Err(e) => {
                prop_assert_eq!(e.kind(), ErrorKind::Configuration);
                prop_assert!(!engine.is_initialized());
            }
        }
    }
}
