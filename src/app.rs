//! Application state and logic for netmon-rs.
//!
//! This module contains the main [`App`] struct which owns the sampler and
//! routes every computed record to the configured sinks.

use chrono::Utc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::sampler::{Sampler, TickReport, Timestamp};
use crate::sink::{ConsoleSink, CsvSink, LatestRecords};
use crate::source::{CounterSource, ProcNetDev};
use crate::thresholds::Thresholds;

/// Main application state.
///
/// Holds configuration, the sampler, and the sinks records are fanned out
/// to: an optional CSV log, an optional console printer (headless mode) and
/// the latest-record table the dashboard draws from.
pub struct App<R = ProcNetDev> {
    /// Application configuration from CLI
    pub config: Config,

    /// Sampling engine (owns the retained counters)
    sampler: Sampler<R>,

    /// CSV writer for logging
    csv: Option<CsvSink>,

    /// Console printer, only in headless mode
    console: Option<ConsoleSink>,

    /// Latest record per interface
    pub latest: LatestRecords,

    /// Threshold configuration
    pub thresholds: Thresholds,

    /// Ticks completed since startup
    pub ticks: u64,

    /// Outcome of the most recent tick
    pub last_report: Option<TickReport>,
}

impl App<ProcNetDev> {
    /// Create a new application instance reading the configured source.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter table cannot be read (nothing can be
    /// monitored) or if the CSV file cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        let source = ProcNetDev::new(&config.source);
        Self::with_source(config, source)
    }
}

impl<R: CounterSource> App<R> {
    /// Create an application over an arbitrary counter source.
    pub fn with_source(config: Config, source: R) -> Result<Self> {
        let sampler = Sampler::initialize(source)?;

        let csv = match &config.csv_file {
            Some(path) => {
                let sink = CsvSink::open(path)?;
                info!(path = %sink.path().display(), "logging records to CSV");
                Some(sink)
            }
            None => None,
        };

        let console = config.headless.then_some(ConsoleSink);

        Ok(Self {
            config,
            sampler,
            csv,
            console,
            latest: LatestRecords::new(),
            thresholds: Thresholds::default(),
            ticks: 0,
            last_report: None,
        })
    }

    /// Sample now.
    pub fn collect(&mut self) -> Result<TickReport> {
        self.collect_at(Utc::now())
    }

    /// Sample with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Fails when the counter table can no longer be read; the caller should
    /// stop the loop.
    pub fn collect_at(&mut self, now: Timestamp) -> Result<TickReport> {
        let mut sinks = (&mut self.csv, (&mut self.console, &mut self.latest));
        let report = self.sampler.tick(now, &mut sinks)?;

        self.ticks += 1;
        self.last_report = Some(report);
        debug!(
            tick = self.ticks,
            matched = report.matched,
            seeded = report.seeded,
            published = report.published,
            skipped = report.skipped,
            "tick complete"
        );

        Ok(report)
    }

    /// The sampler, for read-only inspection.
    pub fn sampler(&self) -> &Sampler<R> {
        &self.sampler
    }
}
