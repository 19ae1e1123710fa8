//! Telemetry sinks for computed interface rates.
//!
//! The sampler hands every [`MetricsRecord`] to a [`TelemetrySink`] keyed by
//! interface name and forgets about it. Delivery is fire-and-forget: a sink
//! that fails logs the problem and carries on.
//!
//! Sinks compose: `Option<S>` is a sink that may be switched off, `(A, B)`
//! publishes to both, and `&mut S` forwards to `S`.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::metrics::{EntityName, MetricsRecord};

/// Receiver of per-interface metrics.
pub trait TelemetrySink {
    /// Deliver one record for `entity`.
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord);
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
        (**self).publish(entity, record);
    }
}

impl<S: TelemetrySink> TelemetrySink for Option<S> {
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
        if let Some(sink) = self {
            sink.publish(entity, record);
        }
    }
}

impl<A: TelemetrySink, B: TelemetrySink> TelemetrySink for (A, B) {
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
        self.0.publish(entity, record.clone());
        self.1.publish(entity, record);
    }
}

/// Prints one line per record to stdout (headless mode).
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl TelemetrySink for ConsoleSink {
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
        println!(
            "[{}] {:<12} rx: {:>14} bit/s ({:6.2}% err) | tx: {:>14} bit/s ({:6.2}% err)",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            entity,
            record.rx_bits_per_sec,
            record.rx_error_rate_pct,
            record.tx_bits_per_sec,
            record.tx_error_rate_pct,
        );
    }
}

/// One CSV row: a record plus the time it was written.
#[derive(Serialize)]
struct CsvRow<'a> {
    /// Unix timestamp (seconds since epoch)
    timestamp: i64,
    /// ISO 8601 formatted datetime string
    datetime: String,
    entity: &'a str,
    tx_bits_per_sec: i64,
    rx_bits_per_sec: i64,
    tx_error_rate_pct: f64,
    rx_error_rate_pct: f64,
}

/// Appends every record to a CSV file.
///
/// The header is written only when the file is created, so restarts keep
/// appending to the same table.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Open (or create) the CSV log at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let exists = path.exists();
        let file = OpenOptions::new().append(true).create(true).open(path)?;

        let writer = csv::WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);

        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    /// Path of the CSV log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, entity: &EntityName, record: &MetricsRecord) -> Result<()> {
        let now = Utc::now();
        self.writer.serialize(CsvRow {
            timestamp: now.timestamp(),
            datetime: now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            entity: entity.as_str(),
            tx_bits_per_sec: record.tx_bits_per_sec,
            rx_bits_per_sec: record.rx_bits_per_sec,
            tx_error_rate_pct: record.tx_error_rate_pct,
            rx_error_rate_pct: record.rx_error_rate_pct,
        })?;
        self.writer.flush()?;
        Ok(())
    }
}

impl TelemetrySink for CsvSink {
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
        if let Err(e) = self.write(entity, &record) {
            warn!(path = %self.path.display(), %entity, "failed to log metrics: {e}");
        }
    }
}

/// Keeps the most recent record of every interface, for the dashboard.
#[derive(Debug, Default)]
pub struct LatestRecords {
    records: BTreeMap<EntityName, MetricsRecord>,
    last_update: Option<DateTime<Utc>>,
}

impl LatestRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest record for `entity`, if any has been published.
    pub fn get(&self, entity: &str) -> Option<&MetricsRecord> {
        self.records.get(entity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the last record arrived.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

impl TelemetrySink for LatestRecords {
    fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
        self.records.insert(entity.clone(), record);
        self.last_update = Some(Utc::now());
    }
}

#[cfg(test)]
pub mod mock {
    //! Sinks for tests.

    use super::TelemetrySink;
    use crate::metrics::{EntityName, MetricsRecord};

    /// Remembers every publication in order.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub published: Vec<(EntityName, MetricsRecord)>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Records published for `entity`, oldest first.
        pub fn for_entity(&self, entity: &str) -> Vec<&MetricsRecord> {
            self.published
                .iter()
                .filter(|(e, _)| e.as_str() == entity)
                .map(|(_, r)| r)
                .collect()
        }

        /// Drop everything recorded so far.
        pub fn clear(&mut self) {
            self.published.clear();
        }
    }

    impl TelemetrySink for RecordingSink {
        fn publish(&mut self, entity: &EntityName, record: MetricsRecord) {
            self.published.push((entity.clone(), record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::RecordingSink;
    use super::*;
    use crate::error::Error;

    fn record(name: &str, tx: i64) -> (EntityName, MetricsRecord) {
        let entity = EntityName::new(name).unwrap();
        let record = MetricsRecord {
            entity: entity.clone(),
            tx_bits_per_sec: tx,
            rx_bits_per_sec: 0,
            tx_error_rate_pct: 0.0,
            rx_error_rate_pct: 0.0,
        };
        (entity, record)
    }

    #[test]
    fn test_latest_records_keeps_newest() {
        let mut latest = LatestRecords::new();
        assert!(latest.last_update().is_none());

        let (eth0, first) = record("eth0", 100);
        let (_, second) = record("eth0", 200);
        let (lo, third) = record("lo", 5);
        latest.publish(&eth0, first);
        latest.publish(&eth0, second);
        latest.publish(&lo, third);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest.get("eth0").unwrap().tx_bits_per_sec, 200);
        assert!(latest.last_update().is_some());
        assert_eq!(latest.get("lo").unwrap().tx_bits_per_sec, 5);
        assert!(latest.get("wlan0").is_none());
    }

    #[test]
    fn test_pair_and_option_fan_out() {
        let mut a = RecordingSink::new();
        let mut b: Option<RecordingSink> = None;
        let (eth0, rec) = record("eth0", 1);
        (&mut a, &mut b).publish(&eth0, rec.clone());
        assert_eq!(a.published.len(), 1);
        assert!(b.is_none());

        let mut b = Some(RecordingSink::new());
        (&mut a, &mut b).publish(&eth0, rec);
        assert_eq!(a.published.len(), 2);
        assert_eq!(b.unwrap().published.len(), 1);
    }

    #[test]
    fn test_csv_sink_open_failure_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("rates.csv");
        let err = CsvSink::open(&path).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_csv_sink_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");

        {
            let mut sink = CsvSink::open(&path).unwrap();
            assert_eq!(sink.path(), path.as_path());
            let (eth0, rec) = record("eth0", 8000);
            sink.publish(&eth0, rec);
        }
        {
            let mut sink = CsvSink::open(&path).unwrap();
            let (eth1, rec) = record("eth1", -16);
            sink.publish(&eth1, rec);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,datetime,entity,tx_bits_per_sec"));
        assert!(lines[1].contains(",eth0,8000,"));
        assert!(lines[2].contains(",eth1,-16,"));
    }
}
