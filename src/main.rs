use vpaid_probe::cli::{Args, Command};
use vpaid_probe::collaborators::{EnvironmentVars, HttpBeacon, NullBeacon, TrackingBeacon};
use vpaid_probe::config::ProbeSettings;
use vpaid_probe::entities::{AdEvent, ViewMode};
use vpaid_probe::host::{HostPlayer, Scenario, ScenarioReport};
use vpaid_probe::paths::{self, PathConfig};
use vpaid_probe::server::{PanelServer, SharedPanelState};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns false when a scenario ran but failed.
fn run(args: Args) -> Result<bool> {
    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());

    // Ensure directories exist
    if let Err(e) = paths::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    init_logging(&args, &path_config)?;

    info!("vpaid-probe {} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);
    info!("Config path: {}", paths::config_file(paths::SETTINGS_FILE, &path_config).display());

    let settings = ProbeSettings::load(&path_config)?;

    match args.command {
        Command::Run { scenario, json } => cmd_run(scenario, json, &settings),
        Command::Serve { port, no_beacon } => {
            cmd_serve(port.unwrap_or(settings.server_port), no_beacon, &settings)?;
            Ok(true)
        }
        Command::Events => {
            cmd_events();
            Ok(true)
        }
    }
}

fn init_logging(args: &Args, path_config: &PathConfig) -> Result<()> {
    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Initialize logger based on --log flag
    if let Some(log_path_opt) = &args.log_file {
        // File logging with specified verbosity level
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| paths::data_file(paths::LOG_FILE, path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("tiny_http", log::LevelFilter::Warn) // Suppress per-connection spam
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging with specified verbosity level (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("tiny_http", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

fn make_beacon(settings: &ProbeSettings, disabled: bool) -> Result<Box<dyn TrackingBeacon>> {
    if disabled || !settings.beacon_enabled {
        info!("Tracking beacon disabled");
        return Ok(Box::new(NullBeacon));
    }
    let beacon = HttpBeacon::spawn(&settings.beacon_url, settings.beacon_queue, settings.beacon_timeout())
        .context("Failed to start beacon worker")?;
    info!("Tracking beacon -> {}", beacon.base_url());
    Ok(Box::new(beacon))
}

fn cmd_run(scenario: Option<PathBuf>, json: bool, settings: &ProbeSettings) -> Result<bool> {
    let scenario = match scenario {
        Some(path) => Scenario::load(&path)?,
        None => Scenario::compliance(),
    };

    let mut host = HostPlayer::new(make_beacon(settings, false)?);
    let report = scenario.run(&mut host);

    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    } else {
        print_report(&report);
    }
    Ok(report.passed)
}

fn print_report(report: &ScenarioReport) {
    println!("Scenario: {}", report.name);
    for step in &report.steps {
        let mark = if step.passed { "ok  " } else { "FAIL" };
        println!("  {} #{:<3} {:<15} {}", mark, step.index, step.op, step.detail);
    }
    let failed = report.failures().count();
    println!(
        "{}: {} steps, {} failed",
        if report.passed { "PASSED" } else { "FAILED" },
        report.steps.len(),
        failed
    );
}

fn cmd_serve(port: u16, no_beacon: bool, settings: &ProbeSettings) -> Result<()> {
    let mut host = HostPlayer::new(make_beacon(settings, no_beacon)?);

    // The panel's host listens to everything, so every control gets bound
    host.subscribe_all(&AdEvent::KNOWN);
    let version = host.unit_mut().handshake_version(&settings.host_version);
    info!("Handshake: host {} -> ad {}", settings.host_version, version);
    if let Err(e) = host
        .unit_mut()
        .init_ad(640, 480, ViewMode::Normal, 500, "", EnvironmentVars::default())
    {
        warn!("initAd: {}", e);
    }

    let state = Arc::new(SharedPanelState::default());
    state.publish(&host, None);

    let commands = PanelServer::start(port, Arc::clone(&state)).context("Failed to start control panel")?;
    println!("Control panel: http://127.0.0.1:{}/", port);

    // Ends when the server thread goes away
    for command in commands {
        debug!("Panel command: {:?}", command);
        let call = command.apply(&mut host);
        state.publish(&host, Some(call));
    }

    anyhow::bail!("Control panel server stopped")
}

fn cmd_events() {
    println!("{:<28} {:<10} {}", "EVENT", "CONTROL", "BEACON");
    for event in AdEvent::KNOWN.iter() {
        println!(
            "{:<28} {:<10} {}",
            event.as_str(),
            format!("{:?}", event.control_class()).to_lowercase(),
            if event.is_tracked() { "yes" } else { "" }
        );
    }
    println!("\nAny other name is accepted as a custom event (no control).");
}
