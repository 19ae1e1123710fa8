//! Line parser for the `/proc/net/dev` counter table.
//!
//! A data line looks like
//!
//! ```text
//!   eth0: 1234 10 0 0 0 0 0 0 5678 9 0 0 0 0 0 0
//! ```
//!
//! i.e. an interface name, a colon, then sixteen counters: eight receive
//! columns (bytes, packets, errs, drop, fifo, frame, compressed, multicast)
//! followed by eight transmit columns (bytes, packets, errs, drop, fifo,
//! colls, carrier, compressed). The two header lines never match.
//!
//! Parsing is a pure function of the line; nothing here fails loudly.

use crate::metrics::{CounterSnapshot, EntityName};

/// Number of counters on a well-formed data line.
pub const FIELD_COUNT: usize = 16;

const RX_BYTES: usize = 0;
const RX_PACKETS: usize = 1;
const RX_ERRORS: usize = 2;
const TX_BYTES: usize = 8;
const TX_PACKETS: usize = 9;
const TX_ERRORS: usize = 10;

/// Result of parsing one line of the counter table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedLine {
    /// The line names an interface and carries at least one counter.
    ///
    /// When the counter count is not [`FIELD_COUNT`] the snapshot is all
    /// zeros rather than a rejection.
    Matched(EntityName, CounterSnapshot),
    /// Header, blank or malformed line.
    NoMatch,
}

/// Parse one line of `/proc/net/dev`.
pub fn parse_line(line: &str) -> ParsedLine {
    let rest = line.trim_start_matches([' ', '\t']);

    let Some((name, tail)) = rest.split_once(':') else {
        return ParsedLine::NoMatch;
    };
    if !name.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return ParsedLine::NoMatch;
    }
    let Some(entity) = EntityName::new(name) else {
        return ParsedLine::NoMatch;
    };

    let fields = leading_counters(tail);
    if fields.is_empty() {
        return ParsedLine::NoMatch;
    }

    ParsedLine::Matched(entity, snapshot_from_fields(&fields))
}

/// Collect the run of non-negative integers at the start of `tail`.
///
/// Each token contributes its leading decimal digits. The run ends at a
/// token without leading digits, after a token with trailing junk, or at a
/// value beyond `u64`.
fn leading_counters(tail: &str) -> Vec<u64> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    for token in tail.split_whitespace() {
        let digits = token
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(token.len());
        let Ok(value) = token[..digits].parse::<u64>() else {
            break;
        };
        fields.push(value);
        if digits < token.len() {
            break;
        }
    }
    fields
}

/// Map positional counters onto a snapshot.
fn snapshot_from_fields(fields: &[u64]) -> CounterSnapshot {
    if fields.len() != FIELD_COUNT {
        return CounterSnapshot::default();
    }

    CounterSnapshot {
        bytes_received: fields[RX_BYTES],
        packets_received: fields[RX_PACKETS],
        errors_received: fields[RX_ERRORS],
        bytes_sent: fields[TX_BYTES],
        packets_sent: fields[TX_PACKETS],
        errors_sent: fields[TX_ERRORS],
    }
}

/// Parse a whole counter table, keeping only matched lines in file order.
pub fn parse_table(text: &str) -> impl Iterator<Item = (EntityName, CounterSnapshot)> + '_ {
    text.lines().filter_map(|line| match parse_line(line) {
        ParsedLine::Matched(entity, snapshot) => Some((entity, snapshot)),
        ParsedLine::NoMatch => None,
    })
}
