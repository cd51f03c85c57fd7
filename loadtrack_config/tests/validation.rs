use loadtrack_config::load_toml;
use rstest::rstest;

#[test]
fn empty_toml_is_a_complete_config() {
    let cfg = load_toml("").expect("empty config parses");
    cfg.validate().expect("defaults validate");
    assert_eq!(cfg.monitor.loop_period_ms, 200);
    assert!((cfg.monitor.zero_epsilon_kg - 0.5).abs() < f32::EPSILON);
    assert_eq!(cfg.calibration.sample_count, 10);
    assert!((cfg.calibration.default_scale_factor - -7050.0).abs() < f32::EPSILON);
}

#[test]
fn full_toml_round_trips_values() {
    let cfg = load_toml(
        r#"
        [monitor]
        zero_epsilon_kg = 0.25
        loop_period_ms = 100

        [calibration]
        sample_count = 20
        default_scale_factor = 7013.7

        [hardware]
        sensor_read_timeout_ms = 300

        [pins]
        hx711_dt = 5
        hx711_sck = 6

        [storage]
        path = "/var/lib/loadtrack/fields.toml"

        [logging]
        level = "debug"
        "#,
    )
    .expect("parse");
    cfg.validate().expect("validate");
    assert_eq!(cfg.monitor.loop_period_ms, 100);
    assert_eq!(cfg.calibration.sample_count, 20);
    assert_eq!(cfg.pins.hx711_dt, 5);
    assert_eq!(cfg.storage.path, "/var/lib/loadtrack/fields.toml");
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[rstest]
#[case("[monitor]\nloop_period_ms = 0\n", "loop_period_ms")]
#[case("[monitor]\nloop_period_ms = 120000\n", "loop_period_ms")]
#[case("[monitor]\nzero_epsilon_kg = -0.5\n", "zero_epsilon_kg")]
#[case("[monitor]\nzero_epsilon_kg = nan\n", "zero_epsilon_kg")]
#[case("[calibration]\nsample_count = 0\n", "sample_count")]
#[case("[calibration]\ndefault_scale_factor = 0.0\n", "default_scale_factor")]
#[case("[hardware]\nsensor_read_timeout_ms = 0\n", "sensor_read_timeout_ms")]
#[case("[storage]\npath = \"\"\n", "storage.path")]
fn invalid_values_are_rejected(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parses");
    let err = cfg.validate().expect_err("must fail validation");
    let msg = err.to_string();
    assert!(msg.contains(needle), "error {msg:?} should mention {needle}");
}

#[test]
fn unknown_tables_are_tolerated() {
    // serde ignores unknown fields by default; a stray table must not break
    // configs written for a newer build.
    let res = load_toml("[telemetry]\nendpoint = \"tcp://x\"\n");
    assert!(res.is_ok());
}
