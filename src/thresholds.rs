//! Threshold definitions for netmon-rs.
//!
//! This module defines severity levels and threshold values used by the
//! dashboard to highlight interfaces that are dropping packets or whose
//! counters just reset.

use crate::metrics::MetricsRecord;

/// Severity level for a metric.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum Severity {
    /// Normal operating range
    #[default]
    Normal,
    /// Approaching problematic levels
    Warning,
    /// Critical - immediate attention needed
    Critical,
}

/// Threshold configuration for interface metrics.
#[derive(Clone, Debug)]
pub struct Thresholds {
    /// Error rate warning threshold (%)
    pub error_rate_warning: f64,
    /// Error rate critical threshold (%)
    pub error_rate_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            error_rate_warning: 1.0,
            error_rate_critical: 5.0,
        }
    }
}

impl Thresholds {
    /// Evaluate error rate severity.
    pub fn error_rate_severity(&self, value_pct: f64) -> Severity {
        if value_pct >= self.error_rate_critical {
            Severity::Critical
        } else if value_pct >= self.error_rate_warning {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    /// Evaluate a bit rate. Negative means the counter went backwards.
    pub fn bit_rate_severity(&self, bits_per_sec: i64) -> Severity {
        if bits_per_sec < 0 {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }

    /// Worst severity across all fields of a record.
    pub fn record_severity(&self, record: &MetricsRecord) -> Severity {
        [
            self.error_rate_severity(record.tx_error_rate_pct),
            self.error_rate_severity(record.rx_error_rate_pct),
            self.bit_rate_severity(record.tx_bits_per_sec),
            self.bit_rate_severity(record.rx_bits_per_sec),
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::EntityName;

    #[test]
    fn test_error_rate_severity() {
        let t = Thresholds::default();
        assert_eq!(t.error_rate_severity(0.0), Severity::Normal);
        assert_eq!(t.error_rate_severity(0.99), Severity::Normal);
        assert_eq!(t.error_rate_severity(1.0), Severity::Warning);
        assert_eq!(t.error_rate_severity(5.0), Severity::Critical);
        assert_eq!(t.error_rate_severity(-3.0), Severity::Normal);
    }

    #[test]
    fn test_record_severity_takes_worst() {
        let t = Thresholds::default();
        let mut record = MetricsRecord {
            entity: EntityName::new("eth0").unwrap(),
            tx_bits_per_sec: 1000,
            rx_bits_per_sec: 1000,
            tx_error_rate_pct: 0.0,
            rx_error_rate_pct: 0.0,
        };
        assert_eq!(t.record_severity(&record), Severity::Normal);

        record.rx_bits_per_sec = -8;
        assert_eq!(t.record_severity(&record), Severity::Warning);

        record.tx_error_rate_pct = 12.5;
        assert_eq!(t.record_severity(&record), Severity::Critical);
    }
}
