//! Metrics data structures for netmon-rs.
//!
//! This module defines the raw per-interface [`CounterSnapshot`], the
//! [`EntityName`] key, and the derived [`MetricsRecord`] handed to sinks,
//! together with the delta and rate arithmetic between two snapshots.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

/// Name of a monitored interface (e.g. `eth0`).
///
/// Always non-empty. Assigned the first time an interface is parsed and
/// never renamed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityName(String);

impl EntityName {
    /// Create a name, rejecting the empty string.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Raw interface counters from one line of `/proc/net/dev`.
///
/// Values are copied verbatim from the kernel; nothing checks that they are
/// monotonic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Bytes received
    pub bytes_received: u64,
    /// Bytes transmitted
    pub bytes_sent: u64,
    /// Packets received
    pub packets_received: u64,
    /// Packets transmitted
    pub packets_sent: u64,
    /// Receive errors
    pub errors_received: u64,
    /// Transmit errors
    pub errors_sent: u64,
}

/// Rates derived from two consecutive snapshots of one interface.
///
/// Bit rates are signed: a counter that went backwards (reset, wraparound,
/// driver reload) yields a negative rate for that tick.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct MetricsRecord {
    /// Interface the rates belong to
    pub entity: EntityName,
    /// Transmit throughput in bits per second
    pub tx_bits_per_sec: i64,
    /// Receive throughput in bits per second
    pub rx_bits_per_sec: i64,
    /// Transmit errors per transmitted packet, in percent
    pub tx_error_rate_pct: f64,
    /// Receive errors per received packet, in percent
    pub rx_error_rate_pct: f64,
}

impl MetricsRecord {
    /// Compute rates between `prev` and `cur`, captured `elapsed_secs` apart.
    ///
    /// Returns `None` when the window is zero, negative or not finite; there
    /// is no meaningful rate to publish for such a window.
    pub fn between(
        entity: EntityName,
        prev: &CounterSnapshot,
        cur: &CounterSnapshot,
        elapsed_secs: f64,
    ) -> Option<Self> {
        if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
            return None;
        }

        Some(Self {
            entity,
            tx_bits_per_sec: bits_per_sec(prev.bytes_sent, cur.bytes_sent, elapsed_secs),
            rx_bits_per_sec: bits_per_sec(prev.bytes_received, cur.bytes_received, elapsed_secs),
            tx_error_rate_pct: error_rate_pct(
                prev.errors_sent,
                cur.errors_sent,
                prev.packets_sent,
                cur.packets_sent,
            ),
            rx_error_rate_pct: error_rate_pct(
                prev.errors_received,
                cur.errors_received,
                prev.packets_received,
                cur.packets_received,
            ),
        })
    }
}

/// Signed difference between two raw counters.
fn signed_delta(prev: u64, cur: u64) -> i128 {
    i128::from(cur) - i128::from(prev)
}

/// Byte delta converted to bits per second, rounded to the nearest integer.
///
/// `elapsed_secs` must be positive. The float-to-int cast saturates, so an
/// absurd delta over a tiny window clamps to `i64::MIN`/`i64::MAX`.
pub fn bits_per_sec(prev_bytes: u64, cur_bytes: u64, elapsed_secs: f64) -> i64 {
    let bits = signed_delta(prev_bytes, cur_bytes) as f64 * 8.0;
    (bits / elapsed_secs).round() as i64
}

/// Error delta over packet delta, in percent.
///
/// Only defined when the packet counter grew; otherwise 0.0.
pub fn error_rate_pct(prev_errors: u64, cur_errors: u64, prev_packets: u64, cur_packets: u64) -> f64 {
    if cur_packets <= prev_packets {
        return 0.0;
    }
    let errors = signed_delta(prev_errors, cur_errors) as f64;
    let packets = (cur_packets - prev_packets) as f64;
    errors / packets * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth0() -> EntityName {
        EntityName::new("eth0").unwrap()
    }

    #[test]
    fn test_entity_name_rejects_empty() {
        assert!(EntityName::new("").is_none());
        assert_eq!(eth0().as_str(), "eth0");
        assert_eq!(eth0().to_string(), "eth0");
    }

    #[test]
    fn test_tx_bits_per_sec_one_second() {
        let prev = CounterSnapshot {
            bytes_sent: 1000,
            ..Default::default()
        };
        let cur = CounterSnapshot {
            bytes_sent: 2000,
            ..Default::default()
        };
        let record = MetricsRecord::between(eth0(), &prev, &cur, 1.0).unwrap();
        assert_eq!(record.tx_bits_per_sec, 8000);
        assert_eq!(record.rx_bits_per_sec, 0);
    }

    #[test]
    fn test_rate_scales_with_irregular_interval() {
        // 1500 bytes over 2.5s = 4800 bit/s
        assert_eq!(bits_per_sec(0, 1500, 2.5), 4800);
        // 1 byte over 3s = 2.666.. rounds to 3
        assert_eq!(bits_per_sec(10, 11, 3.0), 3);
    }

    #[test]
    fn test_counter_reset_gives_negative_finite_rate() {
        let prev = CounterSnapshot {
            bytes_sent: 5000,
            bytes_received: 7000,
            ..Default::default()
        };
        let cur = CounterSnapshot {
            bytes_sent: 1000,
            bytes_received: 0,
            ..Default::default()
        };
        let record = MetricsRecord::between(eth0(), &prev, &cur, 2.0).unwrap();
        assert_eq!(record.tx_bits_per_sec, -16000);
        assert_eq!(record.rx_bits_per_sec, -28000);
    }

    #[test]
    fn test_full_range_reset_does_not_overflow() {
        let rate = bits_per_sec(u64::MAX, 0, 1.0);
        assert!(rate < 0);
        assert_eq!(bits_per_sec(0, u64::MAX, 1e-9), i64::MAX);
    }

    #[test]
    fn test_error_rate_without_packet_growth_is_zero() {
        let prev = CounterSnapshot {
            packets_sent: 10,
            errors_sent: 1,
            ..Default::default()
        };
        let cur = CounterSnapshot {
            packets_sent: 10,
            errors_sent: 2,
            ..Default::default()
        };
        let record = MetricsRecord::between(eth0(), &prev, &cur, 1.0).unwrap();
        assert_eq!(record.tx_error_rate_pct, 0.0);
    }

    #[test]
    fn test_error_rate_with_packet_decrease_is_zero() {
        assert_eq!(error_rate_pct(0, 5, 100, 40), 0.0);
    }

    #[test]
    fn test_error_rate_percent() {
        // 3 errors over 200 packets
        assert!((error_rate_pct(1, 4, 100, 300) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rx_and_tx_error_rates_are_independent() {
        let prev = CounterSnapshot::default();
        let cur = CounterSnapshot {
            packets_received: 50,
            errors_received: 5,
            packets_sent: 0,
            errors_sent: 3,
            ..Default::default()
        };
        let record = MetricsRecord::between(eth0(), &prev, &cur, 1.0).unwrap();
        assert!((record.rx_error_rate_pct - 10.0).abs() < 1e-12);
        assert_eq!(record.tx_error_rate_pct, 0.0);
    }

    #[test]
    fn test_non_positive_interval_yields_nothing() {
        let snap = CounterSnapshot::default();
        assert!(MetricsRecord::between(eth0(), &snap, &snap, 0.0).is_none());
        assert!(MetricsRecord::between(eth0(), &snap, &snap, -0.5).is_none());
        assert!(MetricsRecord::between(eth0(), &snap, &snap, f64::NAN).is_none());
        assert!(MetricsRecord::between(eth0(), &snap, &snap, f64::INFINITY).is_none());
    }
}
