mod cli;
mod error_fmt;
mod panel;
mod run;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(err) = try_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn try_main(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;
    let cfg = load_config(&cli.config)?;
    init_logging(&cli, &cfg.logging);

    match cli.cmd {
        Commands::Run { store, iterations } => {
            let shutdown = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || {
                flag.store(true, std::sync::atomic::Ordering::Relaxed);
            })
            .wrap_err("install Ctrl-C handler")?;
            run::run(&cfg, store, iterations, shutdown)
        }
        Commands::Status { store } => run::status(&cfg, store),
        Commands::SelfCheck => run::self_check(&cfg),
    }
}

/// A missing config file is not an error: every section has defaults.
fn load_config(path: &std::path::Path) -> eyre::Result<loadtrack_config::Config> {
    if !path.exists() {
        return Ok(loadtrack_config::Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = loadtrack_config::load_toml(&text).wrap_err("parse config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Console logging goes to stderr (stdout belongs to the panel); an optional
/// JSON-lines file sink comes from the `[logging]` config section.
fn init_logging(cli: &Cli, log_cfg: &loadtrack_config::Logging) {
    let directive = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| log_cfg.level.clone())
        .unwrap_or_else(|| cli.log_level.clone());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if cli.json {
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed(),
        );
    } else {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if let Some(file) = &log_cfg.file {
        let path = std::path::Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "loadtrack.log".into());
        let appender = match log_cfg.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed(),
        );
    }

    Registry::default().with(layers).with(filter).init();
}
