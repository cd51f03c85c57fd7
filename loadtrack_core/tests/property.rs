use loadtrack_core::LoadMonitor;
use proptest::prelude::*;

const EPSILON_KG: f32 = 0.5;

/// Reference model: count unload edges and sum the latched weights
/// directly, without going through the detector.
fn expected(samples: &[f32]) -> (u32, f64) {
    let mut loaded = false;
    let mut last = 0.0f32;
    let mut count = 0u32;
    let mut total = 0.0f64;
    for &s in samples {
        let w = if s.abs() < EPSILON_KG { 0.0 } else { s };
        if w > 0.0 {
            loaded = true;
            last = w;
        } else if w == 0.0 && loaded {
            count += 1;
            total += f64::from(last);
            loaded = false;
            last = 0.0;
        }
    }
    (count, total)
}

fn samples_strategy() -> impl Strategy<Value = Vec<f32>> {
    // Mix of dead zone values, plausible loads, and drift below zero.
    prop::collection::vec(
        prop_oneof![
            3 => Just(0.0f32),
            2 => (-0.49f32..0.49f32),
            4 => (0.5f32..5000.0f32),
            1 => (-30.0f32..-0.5f32),
        ],
        0..200,
    )
}

proptest! {
    #[test]
    fn count_equals_unload_edges_and_total_equals_latched_sum(samples in samples_strategy()) {
        let mut monitor = LoadMonitor::new(EPSILON_KG);
        let mut count = 0u32;
        let mut total = 0.0f64;
        for &s in &samples {
            if let Some(e) = monitor.observe(s) {
                prop_assert!(e.weight_kg > 0.0);
                count += 1;
                total += f64::from(e.weight_kg);
            }
        }
        let (want_count, want_total) = expected(&samples);
        prop_assert_eq!(count, want_count);
        prop_assert!((total - want_total).abs() < 1e-3);
    }

    #[test]
    fn tare_never_touches_event_weights(samples in samples_strategy(), tare_at in 0usize..200) {
        // Tare at an arbitrary point only ever drops at most the one load
        // latched at that moment; every emitted weight is still positive.
        let mut monitor = LoadMonitor::new(EPSILON_KG);
        let mut emitted = 0u32;
        for (i, &s) in samples.iter().enumerate() {
            if i == tare_at {
                monitor.tare();
            }
            if let Some(e) = monitor.observe(s) {
                prop_assert!(e.weight_kg >= EPSILON_KG);
                emitted += 1;
            }
        }
        let (baseline, _) = expected(&samples);
        // Tare can only suppress events, never add them.
        prop_assert!(emitted <= baseline);
    }
}
