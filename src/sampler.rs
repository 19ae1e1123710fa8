//! Sampling and delta engine.
//!
//! The [`Sampler`] owns the last snapshot seen for every interface. Each
//! tick re-reads the counter table, diffs every interface against its
//! retained snapshot, publishes the resulting rates and replaces the
//! retained entry.
//!
//! Per interface the lifecycle is `Unseen -> Seeded -> Active`:
//!
//! - the first time a name is parsed its snapshot is stored and nothing is
//!   published (there is nothing to diff against yet);
//! - every later parse publishes one [`MetricsRecord`] and overwrites the
//!   stored snapshot;
//! - an interface that disappears from the table keeps its last snapshot and
//!   simply stops publishing.
//!
//! Rates are computed from the wall-clock time between the two captures, not
//! from the nominal tick period, so late or early ticks do not skew them.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::Result;
use crate::metrics::{CounterSnapshot, EntityName, MetricsRecord};
use crate::parser::parse_table;
use crate::sink::TelemetrySink;
use crate::source::CounterSource;

/// Wall-clock capture time.
pub type Timestamp = DateTime<Utc>;

/// Last snapshot of an interface and when it was taken.
#[derive(Clone, Copy, Debug)]
struct Retained {
    snapshot: CounterSnapshot,
    captured_at: Timestamp,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Lines that parsed as an interface
    pub matched: usize,
    /// Interfaces seen for the first time (nothing published)
    pub seeded: usize,
    /// Records handed to the sink
    pub published: usize,
    /// Interfaces skipped because no time elapsed since their last capture
    pub skipped: usize,
}

/// Stateful per-interface sampler.
///
/// A `Sampler` only exists once the counter table has been read
/// successfully; if [`Sampler::initialize`] fails there is nothing to tick.
pub struct Sampler<R> {
    source: R,
    retained: HashMap<EntityName, Retained>,
}

impl<R: CounterSource> Sampler<R> {
    /// Read the counter table once and seed every interface found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`](crate::error::Error::SourceUnavailable)
    /// if the table cannot be read.
    pub fn initialize(source: R) -> Result<Self> {
        Self::initialize_at(source, Utc::now())
    }

    /// Same as [`Sampler::initialize`] with an explicit capture time.
    pub fn initialize_at(mut source: R, now: Timestamp) -> Result<Self> {
        let text = source.read_current_text()?;

        let mut retained = HashMap::new();
        for (entity, snapshot) in parse_table(&text) {
            retained.insert(
                entity,
                Retained {
                    snapshot,
                    captured_at: now,
                },
            );
        }

        info!(
            source = %source.location().display(),
            "{} interface(s) found",
            retained.len()
        );

        Ok(Self { source, retained })
    }

    /// Run one sampling pass at time `now`.
    ///
    /// # Errors
    ///
    /// A failed read of the counter table is returned as-is and leaves the
    /// retained state untouched; callers are expected to stop ticking.
    pub fn tick<S>(&mut self, now: Timestamp, sink: &mut S) -> Result<TickReport>
    where
        S: TelemetrySink + ?Sized,
    {
        let text = self.source.read_current_text()?;
        let mut report = TickReport::default();

        for (entity, snapshot) in parse_table(&text) {
            report.matched += 1;
            let current = Retained {
                snapshot,
                captured_at: now,
            };

            match self.retained.entry(entity) {
                Entry::Vacant(slot) => {
                    debug!(entity = %slot.key(), "new interface");
                    slot.insert(current);
                    report.seeded += 1;
                }
                Entry::Occupied(mut slot) => {
                    let prev = *slot.get();
                    let elapsed = elapsed_secs(prev.captured_at, now);

                    match MetricsRecord::between(
                        slot.key().clone(),
                        &prev.snapshot,
                        &snapshot,
                        elapsed,
                    ) {
                        Some(record) => {
                            debug!(
                                "{:1.3} {}\t\trate : {:>10}, {:>10}, {:3.2}, {:3.2}",
                                elapsed,
                                slot.key(),
                                record.tx_bits_per_sec,
                                record.rx_bits_per_sec,
                                record.tx_error_rate_pct,
                                record.rx_error_rate_pct
                            );
                            sink.publish(slot.key(), record);
                            report.published += 1;
                        }
                        None => {
                            debug!(
                                entity = %slot.key(),
                                elapsed,
                                "no time elapsed since last capture, skipping"
                            );
                            report.skipped += 1;
                        }
                    }

                    slot.insert(current);
                }
            }
        }

        Ok(report)
    }

    /// Number of interfaces ever seen.
    pub fn entity_count(&self) -> usize {
        self.retained.len()
    }

    /// Names of every interface ever seen, sorted.
    pub fn entities(&self) -> Vec<&EntityName> {
        let mut names: Vec<_> = self.retained.keys().collect();
        names.sort();
        names
    }

    /// Where the counter table is read from.
    pub fn location(&self) -> &Path {
        self.source.location()
    }
}

/// Signed seconds from `from` to `to`, with sub-microsecond precision.
fn elapsed_secs(from: Timestamp, to: Timestamp) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        // Only for spans beyond ~292 years
        None => delta.num_seconds() as f64,
    }
}
