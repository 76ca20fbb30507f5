use clap::Parser;
use log::{error, info, warn};
use netmon::config::{JsonFileStorage, SettingsStore};
use netmon::{format_speed, InterfaceProvider, SampleClock, SpeedUnit};
use netmon_sources::SysinfoInterfaceProvider;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// netmon - live network throughput in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "netmon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Settings file to use instead of the platform config directory
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Set and save the refresh rate in milliseconds
    #[arg(short = 'i', long = "interval", value_name = "MS", value_parser = clap::value_parser!(i32).range(1..))]
    interval: Option<i32>,

    /// Set and save the display unit (bps, Kbps, Mbps, Gbps, B/s, KB/s, MB/s, GB/s)
    #[arg(short = 'u', long = "unit", value_name = "UNIT")]
    unit: Option<String>,

    /// Reset all settings to their defaults and save
    #[arg(long = "reset")]
    reset: bool,

    /// Exit after this many samples
    #[arg(short = 'n', long = "count", value_name = "N")]
    count: Option<u64>,

    /// List network interfaces and exit
    #[arg(short = 'l', long = "list")]
    list_interfaces: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting netmon v{}", env!("CARGO_PKG_VERSION"));

    if cli.list_interfaces {
        return print_interfaces();
    }

    let store = match open_store(cli.config.as_ref()) {
        Some(store) => Arc::new(store),
        None => return ExitCode::FAILURE,
    };
    store.load();
    apply_cli_overrides(&cli, &store);

    let clock = Arc::new(SampleClock::new(Box::new(SysinfoInterfaceProvider::new())));

    // Follow refresh rate changes made through the store. The clock's print
    // subscriber holds the store, so only weak references go the other way.
    let weak_store: Weak<SettingsStore> = Arc::downgrade(&store);
    let weak_clock: Weak<SampleClock> = Arc::downgrade(&clock);
    store.subscribe(move || {
        if let (Some(store), Some(clock)) = (weak_store.upgrade(), weak_clock.upgrade()) {
            if let Err(e) = clock.set_interval(store.refresh_rate_ms()) {
                warn!("Ignoring refresh rate from settings: {}", e);
            }
        }
    });

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    let printed = Arc::new(AtomicU64::new(0));
    let limit = cli.count;
    let store_for_print = store.clone();
    clock.subscribe(move |sample| {
        let unit = store_for_print.speed_unit();
        println!(
            "↓ {:>12}  ↑ {:>12}",
            format_speed(sample.download_bytes_per_sec, unit),
            format_speed(sample.upload_bytes_per_sec, unit)
        );
        let n = printed.fetch_add(1, Ordering::SeqCst) + 1;
        if limit.is_some_and(|limit| n >= limit) {
            let _ = done_tx.send(());
        }
    });

    if let Err(e) = clock.start(store.refresh_rate_ms()) {
        error!("Failed to start sampling: {}", e);
        return ExitCode::FAILURE;
    }

    rt.block_on(async {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupted");
            }
            _ = done_rx.recv() => {
                info!("Sample count reached");
            }
        }
    });

    clock.stop();
    ExitCode::SUCCESS
}

/// Open the settings store at the requested or default location
fn open_store(path: Option<&PathBuf>) -> Option<SettingsStore> {
    if let Some(path) = path {
        return Some(SettingsStore::new(JsonFileStorage::new(path)));
    }
    match SettingsStore::with_default_location() {
        Ok(store) => Some(store),
        Err(e) => {
            error!("Could not locate settings (use --config): {}", e);
            None
        }
    }
}

/// Apply --reset/--interval/--unit and save once if anything changed
fn apply_cli_overrides(cli: &Cli, store: &SettingsStore) {
    let mut changed = false;

    if cli.reset {
        store.reset_to_defaults();
        changed = true;
    }
    if let Some(interval) = cli.interval {
        store.update(|s| s.refresh_rate_ms = interval);
        changed = true;
    }
    if let Some(ref name) = cli.unit {
        let unit = SpeedUnit::parse(name).unwrap_or_else(|| {
            warn!("Unknown unit {:?}, using Kbps", name);
            SpeedUnit::Kbps
        });
        store.update(|s| s.speed_unit = unit);
        changed = true;
    }

    if changed {
        if let Err(e) = store.save() {
            warn!("Settings changed for this run only: {}", e);
        }
    }
}

fn print_interfaces() -> ExitCode {
    let mut provider = SysinfoInterfaceProvider::new();
    let metadata = provider.metadata().clone();
    info!("Listing interfaces from '{}'", metadata.id);
    println!("{} ({})", metadata.name, metadata.description);

    match provider.interfaces() {
        Ok(interfaces) => {
            for iface in interfaces {
                println!(
                    "{:<20} {:<8} {:<9} rx {:>15}  tx {:>15}{}",
                    iface.name,
                    format!("{:?}", iface.status),
                    format!("{:?}", iface.kind),
                    iface.bytes_received,
                    iface.bytes_sent,
                    if iface.is_counted() { "" } else { "  (ignored)" }
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to list interfaces: {}", e);
            ExitCode::FAILURE
        }
    }
}
