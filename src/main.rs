//! Fermenter: command-line entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    TargetFile    JsonConfigFile  SystemClock  │
//! │  (DS18B20 + relay)  (TargetPort)  (ConfigPort)    (ClockPort)  │
//! │  LogEventSink       ReportWorker → CsvRenderer → OutboxSink    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  hysteresis · alert FSM · notification throttle        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Runtime: Scheduler · EventQueue · SeriesStore · Heartbeat     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage:
//!   fermenter start                       # run the controller
//!   fermenter set-target 68               # or `off`
//!   fermenter report --start -43200       # send a one-off report
//!   fermenter dump --step 60              # history as CSV

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use fermenter::adapters::config_file::JsonConfigFile;
use fermenter::adapters::csv_renderer::{CSV_HEADER, CsvRenderer, format_row};
use fermenter::adapters::hardware::HardwareAdapter;
use fermenter::adapters::outbox::OutboxSink;
use fermenter::adapters::report::{ReportWorker, deliver_report};
use fermenter::adapters::target_file::TargetFile;
use fermenter::adapters::time::SystemClock;
use fermenter::app::events::{DEFAULT_SUBJECT, ReportRequest};
use fermenter::app::ports::{ClockPort, ConfigPort};
use fermenter::config::FermenterConfig;
use fermenter::drivers::gpio::SysfsPin;
use fermenter::drivers::heartbeat::Heartbeat;
use fermenter::drivers::relay::Relay;
use fermenter::runtime::Runtime;
use fermenter::sensors::ds18b20::Ds18b20;
use fermenter::store::{SeriesStore, SharedStore};
use fermenter::target::Target;

#[derive(Parser)]
#[command(name = "fermenter")]
#[command(about = "Fermentation temperature controller with on-disk history")]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults apply if it does not exist)
    #[arg(short, long, global = true, default_value = "fermenter.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop until interrupted
    Start,

    /// Set the target temperature (45-80 F) or switch regulation off
    #[command(name = "set-target")]
    SetTarget {
        /// Temperature in F, or `off`
        target: String,
    },

    /// Render and send a report for a window of history
    Report {
        /// Window start, seconds since the epoch (negative: relative to the latest sample)
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,

        /// Window end, inclusive (default: latest sample)
        #[arg(long, allow_hyphen_values = true)]
        stop: Option<i64>,
    },

    /// Print recorded samples as CSV
    Dump {
        /// First slot (default: earliest sample)
        #[arg(long, allow_hyphen_values = true)]
        start: Option<i64>,

        /// Last slot, inclusive (default: latest sample)
        #[arg(long, allow_hyphen_values = true)]
        stop: Option<i64>,

        /// Print every Nth slot
        #[arg(long, default_value_t = 1)]
        step: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_port = JsonConfigFile::new(&cli.config);
    let config = config_port
        .load()
        .with_context(|| format!("loading {}", config_port.location().display()))?;

    match cli.command {
        Commands::Start => start(config),
        Commands::SetTarget { target } => set_target(&config, &target),
        Commands::Report { start, stop } => report(&config, start, stop),
        Commands::Dump { start, stop, step } => dump(&config, start, stop, step),
    }
}

// ── start ─────────────────────────────────────────────────────

fn start(config: FermenterConfig) -> Result<()> {
    info!("╔══════════════════════════════════════╗");
    info!("║  Fermenter v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let target_file = TargetFile::new(&config.target_path);
    let initial_target = target_file
        .read()
        .context("no usable target; run `fermenter set-target <F|off>` first")?;

    // Store, relay and sensor are required; failing any of them aborts.
    let store = SeriesStore::open(&config.store_path, config.seconds_per_partition)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    let sensor = Ds18b20::discover(&config.w1_devices_dir).context("thermometer")?;
    let relay_pin = SysfsPin::open(&config.gpio_root, config.relay_pin).context("relay GPIO")?;
    let relay = Relay::new(relay_pin).context("relay")?;
    let hw = HardwareAdapter::new(sensor, relay);

    let store = SharedStore::new(store);
    let outbox = OutboxSink::open(&config.outbox_dir).context("report outbox")?;
    let reports = ReportWorker::start(store.clone(), CsvRenderer::default(), outbox)?;

    let mut runtime = Runtime::new(
        config.clone(),
        hw,
        target_file,
        SystemClock::new(),
        store,
        initial_target,
    )
    .with_reports(reports);

    // The LED is cosmetic: run without it if it cannot be driven.
    if let Some(pin) = config.led_pin {
        let interval = Duration::from_millis(config.heartbeat_interval_ms);
        match SysfsPin::open(&config.gpio_root, pin) {
            Ok(led) => match Heartbeat::start(led, interval) {
                Ok(heartbeat) => runtime = runtime.with_heartbeat(heartbeat),
                Err(e) => warn!("Heartbeat unavailable: {}", e),
            },
            Err(e) => warn!("Heartbeat LED GPIO{} unavailable: {}", pin, e),
        }
    }

    let stop = runtime.stop_handle();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })?;

    runtime.run()?;
    Ok(())
}

// ── set-target ────────────────────────────────────────────────

fn set_target(config: &FermenterConfig, arg: &str) -> Result<()> {
    let target: Target = arg
        .parse()
        .with_context(|| format!("invalid target '{arg}'"))?;
    TargetFile::new(&config.target_path).write(target)?;
    println!("Temperature successfully set to {target}");
    Ok(())
}

// ── report ────────────────────────────────────────────────────

fn report(config: &FermenterConfig, start: Option<i64>, stop: Option<i64>) -> Result<()> {
    let store = SharedStore::new(SeriesStore::open(&config.store_path, config.seconds_per_partition)?);

    let window_start = match start {
        Some(t) => t,
        None => {
            let mut guard = store.lock();
            match guard.first_entry()? {
                Some(first) => guard.cursor_seconds(first) as i64,
                None => SystemClock::new().now_secs(),
            }
        }
    };
    let req = ReportRequest {
        subject: DEFAULT_SUBJECT.to_string(),
        title: "Temperature history".to_string(),
        message: "Here are the requested temperature readings from your brew".to_string(),
        window_start,
        window_end: stop,
        markers: Vec::new(),
    };

    let mut outbox = OutboxSink::open(&config.outbox_dir)?;
    deliver_report(&store, &CsvRenderer::default(), &mut outbox, &req)?;
    println!("Report queued in {}", outbox.dir().display());
    Ok(())
}

// ── dump ──────────────────────────────────────────────────────

fn dump(config: &FermenterConfig, start: Option<i64>, stop: Option<i64>, step: usize) -> Result<()> {
    let mut store = SeriesStore::open(&config.store_path, config.seconds_per_partition)?;
    let records = store.range(start, stop, step)?;

    println!("{CSV_HEADER}");
    for record in records.iter().filter(|r| !r.is_padding()) {
        println!("{}", format_row(record));
    }
    Ok(())
}
