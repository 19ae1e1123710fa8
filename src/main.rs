//! # netmon-rs
//!
//! A per-interface network throughput and error-rate monitor for Linux.
//!
//! ## Overview
//!
//! `netmon-rs` samples the kernel's interface counter table
//! (`/proc/net/dev`) at a fixed rate. For every interface it diffs the
//! current counters against the previous sample and reports:
//!
//! - Receive and transmit throughput in bits per second
//! - Receive and transmit error rates (errors per packet, in percent)
//!
//! Rates use the measured wall-clock time between samples, so scheduler
//! jitter does not distort them. A counter that goes backwards (interface
//! reset, driver reload) shows up as a negative rate for one tick.
//!
//! ## Usage
//!
//! ```bash
//! # Run with TUI (default)
//! netmon-rs
//!
//! # Headless mode, 2 samples per second, CSV log
//! netmon-rs --headless -r 2 -c rates.csv
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`parser`]: Line parser for the counter table
//! - [`metrics`]: Counter snapshots and derived rate records
//! - [`sampler`]: Stateful sampling and delta engine
//! - [`source`]: Counter table readers
//! - [`sink`]: Destinations for computed records
//! - [`trigger`]: Fixed-rate tick schedule
//! - [`app`]: Main application state and coordination
//! - [`ui`]: Terminal user interface

mod app;
mod config;
mod error;
mod metrics;
mod parser;
mod sampler;
mod sink;
mod source;
mod thresholds;
mod trigger;
mod ui;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use error::{Error, Result};
use trigger::PeriodicTrigger;

fn main() -> ExitCode {
    // Platform check - warn on non-Linux systems
    #[cfg(not(target_os = "linux"))]
    {
        eprintln!("WARNING: netmon-rs reads /proc/net/dev, which only exists on Linux.");
        eprintln!("Use --source to point it at a captured counter table.");
        eprintln!();
    }

    let config = Config::parse();

    // Check if stdout is a TTY - if not, force headless mode
    let headless = config.headless || !is_terminal();
    init_logging(config.verbose, config.quiet, headless);
    if !config.headless && headless {
        eprintln!("Warning: stdout is not a TTY, running in headless mode");
    }

    match run(config, headless) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Build the app and drive it until shutdown or a fatal error.
fn run(mut config: Config, headless: bool) -> Result<()> {
    config.headless = headless;
    let trigger = PeriodicTrigger::from_frequency(config.rate)?;
    let app = App::new(config)?;

    // Setup Ctrl+C / SIGTERM handler
    let running = Arc::new(AtomicBool::new(true));
    setup_signal_handler(running.clone());

    info!(
        source = %app.sampler().location().display(),
        interfaces = app.sampler().entity_count(),
        period_ms = trigger.period().as_millis() as u64,
        "start network monitor"
    );

    if headless {
        ui::run_headless(app, running, trigger)
    } else {
        ui::run(app, running, trigger)
    }
}

/// One-line report of the error that stopped the monitor.
fn failure_message(e: &Error) -> String {
    if e.is_source_unavailable() {
        format!("failed to run network monitor, no readable counter table: {e}")
    } else {
        format!("failed to run network monitor: {e}")
    }
}

/// Initialize the tracing subscriber.
///
/// Default level is INFO in headless mode and ERROR under the TUI, so log
/// lines do not scribble over the dashboard. `-v`/`-vv` raise it, `-q`
/// lowers it to errors only; `RUST_LOG` overrides everything.
fn init_logging(verbose: u8, quiet: bool, headless: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match (verbose, headless) {
            (0, true) => Level::INFO,
            (0, false) => Level::ERROR,
            (1, _) => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Global flag for signal handler (must be static for signal safety).
static SIGNAL_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Set up signal handlers for graceful shutdown.
fn setup_signal_handler(running: Arc<AtomicBool>) {
    // Spawn a thread to monitor the signal flag and propagate to running
    let running_clone = running.clone();
    std::thread::spawn(move || {
        while running_clone.load(Ordering::Relaxed) {
            if SIGNAL_RECEIVED.load(Ordering::Relaxed) {
                running_clone.store(false, Ordering::Relaxed);
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
    });

    unsafe {
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
}

/// Signal handler that sets the signal flag (async-signal-safe).
extern "C" fn signal_handler(_: i32) {
    SIGNAL_RECEIVED.store(true, Ordering::Relaxed);
}

/// Check if stdout is connected to a terminal.
fn is_terminal() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_failure_message_names_the_cause_once() {
        let err = Error::SourceUnavailable {
            path: PathBuf::from("/proc/net/dev"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let msg = failure_message(&err);
        assert!(msg.contains("no readable counter table"));
        assert_eq!(msg.matches("/proc/net/dev").count(), 1);

        let msg = failure_message(&Error::InvalidFrequency(0.0));
        assert!(msg.starts_with("failed to run network monitor: invalid sampling frequency"));
    }
}
