//! Hardware assembly and the Run/Status/SelfCheck commands.

use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;

use loadtrack_config::Config;
use loadtrack_core::pump::InputPump;
use loadtrack_core::{CalibrationCfg, MonitorCfg, Timeouts, Tracker};
use loadtrack_hardware::FileStore;
use loadtrack_traits::{Scale, Store, StoreField, StoreValue};

use crate::cli::JSON_MODE;
use crate::panel::ConsolePanel;

fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

fn store_path(cfg: &Config, override_path: Option<PathBuf>) -> PathBuf {
    override_path.unwrap_or_else(|| PathBuf::from(&cfg.storage.path))
}

#[cfg(feature = "hardware")]
fn open_scale(cfg: &Config) -> eyre::Result<impl Scale> {
    let scale =
        loadtrack_hardware::HardwareScale::new(cfg.pins.hx711_dt, cfg.pins.hx711_sck, 25)
            .wrap_err("open HX711 pins")?;
    Ok(scale)
}

#[cfg(not(feature = "hardware"))]
fn open_scale(_cfg: &Config) -> eyre::Result<impl Scale> {
    Ok(loadtrack_hardware::SimulatedScale::new())
}

pub fn run(
    cfg: &Config,
    store_override: Option<PathBuf>,
    iterations: u64,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let path = store_path(cfg, store_override);
    let store =
        FileStore::open(&path).wrap_err_with(|| format!("open store {}", path.display()))?;
    let scale = open_scale(cfg)?;
    let panel = ConsolePanel::new(InputPump::spawn(BufReader::new(std::io::stdin())));

    let mut tracker = Tracker::builder()
        .with_scale(scale)
        .with_store(store)
        .with_panel(panel)
        .with_monitor_cfg(MonitorCfg::from(&cfg.monitor))
        .with_calibration_cfg(CalibrationCfg::from(&cfg.calibration))
        .with_timeouts(Timeouts::from(&cfg.hardware))
        .build()?;

    if iterations == 0 {
        tracker.run(&shutdown)?;
    } else {
        for _ in 0..iterations {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            tracker.step()?;
        }
    }

    let count = tracker.ledger().load_count();
    let total_kg = tracker.ledger().total_kg();
    if json_mode() {
        println!(
            "{}",
            serde_json::json!({ "event": "exit", "load_count": count, "total_kg": total_kg })
        );
    } else {
        println!();
        println!("loads: {count}  total: {total_kg:.1} kg");
    }
    Ok(())
}

pub fn status(cfg: &Config, store_override: Option<PathBuf>) -> eyre::Result<()> {
    let path = store_path(cfg, store_override);
    let mut store =
        FileStore::open(&path).wrap_err_with(|| format!("open store {}", path.display()))?;

    let count = store
        .read(StoreField::LoadCount)
        .map_err(|e| eyre::eyre!("read store: {e}"))?
        .and_then(StoreValue::as_count)
        .unwrap_or(0);
    let total_kg = store
        .read(StoreField::TotalWeight)
        .map_err(|e| eyre::eyre!("read store: {e}"))?
        .and_then(StoreValue::as_real)
        .unwrap_or(0.0);
    let factor = store
        .read(StoreField::ScaleFactor)
        .map_err(|e| eyre::eyre!("read store: {e}"))?
        .and_then(StoreValue::as_real);

    if json_mode() {
        println!(
            "{}",
            serde_json::json!({
                "load_count": count,
                "total_kg": total_kg,
                "scale_factor": factor,
            })
        );
    } else {
        println!("loads:        {count}");
        println!("total:        {total_kg:.1} kg ({:.3} t)", total_kg / 1000.0);
        match factor {
            Some(f) => println!("scale factor: {f:.2}"),
            None => println!("scale factor: (not calibrated)"),
        }
    }
    Ok(())
}

pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let mut scale = open_scale(cfg)?;
    let timeout = Duration::from_millis(cfg.hardware.sensor_read_timeout_ms);
    let weight_kg = scale
        .read(timeout)
        .map_err(|e| eyre::eyre!("scale read: {e}"))?;

    let path = store_path(cfg, None);
    let mut store =
        FileStore::open(&path).wrap_err_with(|| format!("open store {}", path.display()))?;
    store
        .read(StoreField::ScaleFactor)
        .map_err(|e| eyre::eyre!("read store: {e}"))?;

    tracing::info!(weight_kg, store = %path.display(), "self-check passed");
    if json_mode() {
        println!("{}", serde_json::json!({ "self_check": "ok" }));
    } else {
        println!("self-check ok");
    }
    Ok(())
}
