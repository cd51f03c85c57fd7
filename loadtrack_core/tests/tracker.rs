use std::sync::Arc;

use loadtrack_core::mocks::{MemoryStore, ScriptPanel, ScriptScale};
use loadtrack_core::{CalibrationCfg, MonitorCfg, StepOutcome, Timeouts, Tracker};
use loadtrack_traits::clock::TestClock;
use loadtrack_traits::{InputEvent, Notice, StoreField, StoreValue};

type TestTracker = Tracker<ScriptScale, MemoryStore, ScriptPanel>;

fn build(scale: ScriptScale, store: MemoryStore, panel: ScriptPanel) -> TestTracker {
    Tracker::builder()
        .with_scale(scale)
        .with_store(store)
        .with_panel(panel)
        .with_monitor_cfg(MonitorCfg::default())
        .with_calibration_cfg(CalibrationCfg::default())
        .with_timeouts(Timeouts { sensor_ms: 10 })
        .with_clock(Arc::new(TestClock::new()))
        .build()
        .expect("build tracker")
}

#[test]
fn one_load_cycle_commits_one_event() {
    let scale = ScriptScale::new([0.0, 0.0, 12.3, 12.5, 12.0, 0.0, 0.0]);
    let mut tracker = build(scale, MemoryStore::new(), ScriptPanel::new());

    let mut events = 0;
    for _ in 0..7 {
        match tracker.step().expect("step") {
            StepOutcome::Monitored { event: Some(e), .. } => {
                events += 1;
                assert!((e.weight_kg - 12.0).abs() < f32::EPSILON);
            }
            StepOutcome::Monitored { .. } => {}
            StepOutcome::Calibrating { .. } => panic!("not calibrating"),
        }
    }
    assert_eq!(events, 1);
    assert_eq!(tracker.ledger().load_count(), 1);
    assert!((tracker.ledger().total_kg() - 12.0).abs() < f32::EPSILON);
}

#[test]
fn accumulation_is_not_stored_until_store_event() {
    let scale = ScriptScale::new([9.0, 0.0, 0.0]);
    let panel = ScriptPanel::new().idle_for(2).with_events([InputEvent::Store]);
    let mut tracker = build(scale, MemoryStore::new(), panel);

    // Load cycle commits in memory; the Store key arrives on iteration 3.
    tracker.step().expect("latch");
    tracker.step().expect("unload edge");
    let (_, store, panel) = {
        let mut t = tracker;
        t.step().expect("store event");
        t.into_parts()
    };
    assert_eq!(
        store.get(StoreField::LoadCount),
        Some(StoreValue::Count(1))
    );
    assert_eq!(
        store.get(StoreField::TotalWeight),
        Some(StoreValue::Real(9.0))
    );
    assert_eq!(panel.notices, vec![Notice::Stored]);
}

#[test]
fn tare_resets_monitor_but_not_ledger() {
    // Latched at 15 kg, then tare; the later return to zero must not count.
    // (After a real tare the sensor reads zero again, hence the zeros.)
    let scale = ScriptScale::new([15.0, 0.0, 0.0, 0.0]);
    let mut panel = ScriptPanel::new();
    panel.push_event(InputEvent::Tare); // consumed on the first iteration
    let mut tracker = build(scale, MemoryStore::new(), panel);

    for _ in 0..4 {
        tracker.step().expect("step");
    }
    assert_eq!(tracker.ledger().load_count(), 0);
    assert!((tracker.ledger().total_kg()).abs() < f32::EPSILON);

    let (scale, _, _) = tracker.into_parts();
    // One zero() at startup tare, one from the Tare key.
    assert_eq!(scale.zero_calls, 2);
}

#[test]
fn reset_is_durable_immediately() {
    let store = MemoryStore::new()
        .seed(StoreField::LoadCount, StoreValue::Count(7))
        .seed(StoreField::TotalWeight, StoreValue::Real(812.5));
    let panel = ScriptPanel::new().with_events([InputEvent::Reset]);
    let mut tracker = build(ScriptScale::new([0.0]), store, panel);

    assert_eq!(tracker.ledger().load_count(), 7);
    tracker.step().expect("reset event");
    assert_eq!(tracker.ledger().load_count(), 0);

    let (_, store, panel) = tracker.into_parts();
    assert_eq!(
        store.get(StoreField::LoadCount),
        Some(StoreValue::Count(0))
    );
    assert_eq!(
        store.get(StoreField::TotalWeight),
        Some(StoreValue::Real(0.0))
    );
    assert_eq!(panel.notices, vec![Notice::Reset]);
}

#[test]
fn restart_reproduces_stored_ledger() {
    // Two load cycles, then Store on the final iteration.
    let scale = ScriptScale::new([10.0, 0.0, 20.0, 0.0, 0.0]);
    let panel = ScriptPanel::new().idle_for(4).with_events([InputEvent::Store]);
    let mut tracker = build(scale, MemoryStore::new(), panel);
    for _ in 0..5 {
        tracker.step().expect("step");
    }
    assert_eq!(tracker.ledger().load_count(), 2);
    let (_, store, _) = tracker.into_parts();

    // Simulated restart against the same store.
    let tracker2 = build(ScriptScale::new([0.0]), store, ScriptPanel::new());
    assert_eq!(tracker2.ledger().load_count(), 2);
    assert!((tracker2.ledger().total_kg() - 30.0).abs() < f32::EPSILON);
}

#[test]
fn startup_substitutes_default_for_bad_scale_factor() {
    let store = MemoryStore::new().seed(StoreField::ScaleFactor, StoreValue::Real(0.0));
    let tracker = build(ScriptScale::new([0.0]), store, ScriptPanel::new());
    assert!((tracker.scale_factor().get() - -7050.0).abs() < f32::EPSILON);

    // The bad persisted value is substituted, not overwritten.
    let (scale, store, _) = tracker.into_parts();
    assert_eq!(
        store.get(StoreField::ScaleFactor),
        Some(StoreValue::Real(0.0))
    );
    // The sensor still got the usable default at startup.
    assert_eq!(scale.factors_set, vec![-7050.0]);
}

#[test]
fn calibration_flow_commits_factor_and_resumes() {
    let scale = ScriptScale::new([0.0]).with_raw_average(178_850.0);
    let panel = ScriptPanel::new().with_events([
        InputEvent::BeginCalibration,
        InputEvent::Digit('2'),
        InputEvent::Digit('5'),
        InputEvent::DecimalPoint,
        InputEvent::Digit('5'),
        InputEvent::Enter,
    ]);
    let mut tracker = build(scale, MemoryStore::new(), panel);

    // Iteration 1 consumes BeginCalibration while monitoring.
    assert!(matches!(
        tracker.step().expect("step"),
        StepOutcome::Monitored { .. }
    ));
    assert!(tracker.is_calibrating());

    // Four key iterations, then Enter commits.
    let mut committed = None;
    for _ in 0..5 {
        if let StepOutcome::Calibrating {
            committed: Some(c), ..
        } = tracker.step().expect("step")
        {
            committed = Some(c);
        }
    }
    let c = committed.expect("calibration committed");
    assert!((c.known_kg - 25.5).abs() < 1e-4);
    assert!((c.factor.get() - 7013.7256).abs() < 0.01);
    assert!(!tracker.is_calibrating());
    assert!((tracker.scale_factor().get() - 7013.7256).abs() < 0.01);

    let (scale, store, panel) = tracker.into_parts();
    // Startup factor plus the calibrated one.
    assert_eq!(scale.factors_set.len(), 2);
    let persisted = store
        .get(StoreField::ScaleFactor)
        .and_then(StoreValue::as_real)
        .expect("factor persisted");
    assert!((persisted - 7013.7256).abs() < 0.01);
    assert!(panel
        .notices
        .iter()
        .any(|n| matches!(n, Notice::Calibrated { .. })));
}

#[test]
fn empty_enter_keeps_entering() {
    let panel = ScriptPanel::new().with_events([InputEvent::BeginCalibration, InputEvent::Enter]);
    let mut tracker = build(ScriptScale::new([0.0]), MemoryStore::new(), panel);

    tracker.step().expect("begin");
    let out = tracker.step().expect("empty enter");
    assert_eq!(out, StepOutcome::Calibrating { committed: None });
    assert!(tracker.is_calibrating());

    // No side effects reached the store.
    let (_, store, _) = tracker.into_parts();
    assert_eq!(store.get(StoreField::ScaleFactor), None);
}

#[test]
fn monitoring_is_suspended_while_calibrating() {
    // Weight swings through a full cycle during calibration; no event may be
    // recorded.
    let scale = ScriptScale::new([0.0, 30.0, 0.0, 0.0]).with_raw_average(50_000.0);
    let panel = ScriptPanel::new().with_events([
        InputEvent::BeginCalibration,
        InputEvent::Digit('5'),
        InputEvent::Enter,
    ]);
    let mut tracker = build(scale, MemoryStore::new(), panel);

    for _ in 0..4 {
        tracker.step().expect("step");
    }
    assert_eq!(tracker.ledger().load_count(), 0);
}
