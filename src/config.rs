//! Command-line configuration for netmon-rs.
//!
//! This module defines all CLI arguments using `clap` for parsing.
//! The configuration controls the sampling frequency, the counter table
//! location, optional CSV logging, display mode and log verbosity.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::source::PROC_NET_DEV;
use crate::trigger::parse_frequency;

/// Per-interface network throughput and error-rate monitor.
///
/// netmon-rs samples the kernel's interface counters at a fixed rate and
/// reports, for every interface, transmit/receive throughput in bits per
/// second and the percentage of packets that failed in each direction.
///
/// # Examples
///
/// ```bash
/// # Dashboard, one sample per second (default)
/// netmon-rs
///
/// # Headless, four samples per second, logged to CSV
/// netmon-rs --headless -r 4 -c rates.csv
///
/// # Replay a captured counter table
/// netmon-rs -s ./net-dev.txt
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Monitor per-interface network throughput and error rates")]
pub struct Config {
    /// Sampling frequency in ticks per second.
    ///
    /// Rates are always computed from the measured time between samples,
    /// so a late or early tick does not distort them.
    #[arg(short, long, default_value_t = 1.0, value_parser = parse_frequency)]
    pub rate: f64,

    /// Path to the interface counter table.
    #[arg(short, long, default_value = PROC_NET_DEV)]
    pub source: PathBuf,

    /// Path to a CSV log file.
    ///
    /// Every computed record is appended. The file is created if it doesn't
    /// exist; headers are only written once.
    #[arg(short = 'c', long)]
    pub csv_file: Option<PathBuf>,

    /// Run in headless mode (no TUI, one line per record on stdout).
    #[arg(long)]
    pub headless: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}
