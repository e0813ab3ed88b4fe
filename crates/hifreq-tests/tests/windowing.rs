//! End-to-end windowing behaviour of the decay stream.
//!
//! Checks, over long runs with stub and real collaborators:
//! - window lower edges never go backwards and each window spans the duration
//! - re-based particle times lie in `[0, duration)` and are sorted
//! - every generated particle is emitted exactly once, none is dropped
//! - the long-run particle rate matches activity × multiplicity

use std::collections::HashMap;
use std::sync::Arc;

use hifreq_core::properties::Properties;
use hifreq_core::registry::DecayGeneratorRegistry;
use hifreq_models::CascadeGenerator;
use hifreq_stream::DecayStreamEngine;
use hifreq_tests::helpers::*;
use parking_lot::Mutex;

#[test]
fn prompt_decays_single_particle() {
    // 10 Bq, 1 s windows, one particle at offset 0.
    let (mut engine, _) = make_engine(vec![0.0], "10 Bq", "1 s", 2024);
    let first = engine.next_window().expect("first window");
    assert_eq!(engine.max_delay_time(), Some(0.0));
    assert_eq!(first.label, "hifreq");
    assert!(first.len() < 40, "implausible count {}", first.len());
    for p in &first.particles {
        assert!((0.0..1.0).contains(&p.time));
        assert_eq!(p.vertex, Some(VERTEX));
    }
    let expected = format!("{}e-0e+0g0a0X", first.len());
    assert_eq!(first.classification.as_deref(), Some(expected.as_str()));
}

#[test]
fn delayed_particles_are_carried_not_dropped() {
    // Two particles per decay, the second 3 durations after the first.
    // Track ids come in (prompt, delayed) pairs: even id, then id + 1.
    let d = 3.0e-3;
    let (mut engine, generator) = make_engine(vec![0.0, d], "2 kBq", "1 ms", 17);
    let mut ws = windows(&mut engine, 1);
    assert!(engine.max_delay_time().expect("warm-up ran") >= d);

    // Ids below `from` belong to the warm-up, pre-history and window 0;
    // everything in `from..to` comes from regular sampling.
    let from = generator.lock().issued();
    ws.extend(windows(&mut engine, 400));
    let to = generator.lock().issued();
    assert!(to > from);
    // Each window moves the clock by at least one duration, so ten more
    // windows flush every particle buffered so far.
    ws.extend(windows(&mut engine, 10));

    let mut window_of = HashMap::new();
    for (i, w) in ws.iter().enumerate() {
        for p in &w.particles {
            assert!(p.has_vertex());
            let id = p.track_id.expect("track id");
            assert!(window_of.insert(id, i).is_none(), "particle {id} emitted twice");
        }
    }

    for id in from..to {
        assert!(window_of.contains_key(&id), "particle {id} was dropped");
    }
    for prompt in (from..to).step_by(2) {
        assert!(
            window_of[&(prompt + 1)] > window_of[&prompt],
            "delayed partner of {prompt} not in a later window"
        );
    }
    // Window 0 decays obey the same pairing.
    for (&id, &i) in window_of.iter().filter(|(id, _)| **id < from && **id % 2 == 0) {
        let later = window_of.get(&(id + 1)).expect("delayed partner emitted");
        assert!(*later > i);
    }
}

#[test]
fn windows_are_ordered_and_rebased() {
    let duration = 1.0e-3;
    let (mut engine, _) = make_engine(vec![0.0, 2.5e-4, 4.0e-3], "5 kBq", "1 ms", 5);
    let mut last_upper = f64::NEG_INFINITY;
    for _ in 0..1_000 {
        let w = engine.load_next(false).expect("window");
        assert!(w.time >= last_upper, "lower edge before previous upper edge");
        if !w.is_empty() {
            assert_eq!(w.particles[0].time, 0.0, "window not anchored at earliest particle");
        }
        for pair in w.particles.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
        for p in &w.particles {
            assert!(p.time >= 0.0 && p.time < duration, "time {} outside window", p.time);
        }
        last_upper = engine.current_time().expect("initialized");
        assert_eq!(last_upper, w.time + duration);
    }
}

#[test]
fn long_run_rate_matches_activity() {
    // Each call samples exactly one duration of decays, so the rate is taken
    // per sampled duration rather than per span of absolute time.
    let activity = 1_000.0;
    let duration = 1.0e-2;
    let multiplicity = 2.0;
    let n = 2_000;
    let (mut engine, _) = make_engine(vec![0.0, 1.0e-4], "1 kBq", "10 ms", 77);
    let count: usize = windows(&mut engine, n).iter().map(|w| w.len()).sum();
    let rate = count as f64 / (n as f64 * duration);
    let expected = activity * multiplicity;
    assert!(
        (rate - expected).abs() < 0.03 * expected,
        "rate {rate} vs expected {expected}"
    );
}

#[test]
fn cascade_model_end_to_end() {
    // Registered uninitialized: the registry configures it on first lookup.
    let mut reg = DecayGeneratorRegistry::new();
    reg.register(
        "co60",
        Arc::new(Mutex::new(CascadeGenerator::new("co60"))),
        Properties::new()
            .with("line_kinds", vec!["e-", "gamma", "gamma"])
            .with("line_energies", vec!["317.9 keV", "1173.2 keV", "1332.5 keV"])
            .with("line_probabilities", vec![1.0, 1.0, 1.0])
            .with("line_half_lives", vec!["0 s", "0 s", "5 us"]),
    );
    let mut engine = DecayStreamEngine::new("co60_stream", vertex_provider());
    engine
        .initialize(
            &Properties::new()
                .with("activity", "50 kBq")
                .with("duration", "10 us")
                .with("event_generator_name", "co60")
                .with("seed", 11_i64),
            &reg,
        )
        .expect("initialize engine");

    let mut totals = [0usize; 2];
    for w in windows(&mut engine, 5_000) {
        for p in &w.particles {
            match p.kind.label() {
                "e-" => totals[0] += 1,
                "gamma" => totals[1] += 1,
                other => panic!("unexpected species {other}"),
            }
            assert!(p.time < 1.0e-5);
        }
    }
    // two gammas per electron in the long run
    let ratio = totals[1] as f64 / totals[0] as f64;
    assert!((ratio - 2.0).abs() < 0.1, "gamma/e- ratio {ratio}");
    assert!(engine.max_delay_time().expect("warm-up ran") > 1.0e-5);
}
