//! NetFlow v5 wire format.
//!
//! Decodes exporter datagrams into a [`FlowHeader`] plus a run of fixed-size
//! [`FlowRecord`]s, and encodes them back for test fixtures.
//!
//! Layout (all fields big-endian):
//! - header: 24 bytes
//! - record: 48 bytes, `count` of them starting at offset 24

mod datagram;
mod header;
mod record;
mod time;

pub use datagram::{decode_datagram, Datagram};
pub use header::{FlowHeader, HEADER_LEN, NETFLOW_V5_VERSION};
pub use record::{FlowRecord, RECORD_LEN};
pub use time::{absolute_first_ms, format_timestamp_ms, TICK_ROLLOVER};

use thiserror::Error;

/// Errors from decoding a datagram.
///
/// A datagram that fails to decode is dropped by the caller; nothing is
/// repaired or partially accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("datagram too short for header: {len} bytes, need {}", HEADER_LEN)]
    TruncatedHeader { len: usize },

    #[error("datagram too short for {count} records: {len} bytes, need {needed}")]
    TruncatedRecords { count: u16, len: usize, needed: usize },

    #[error("record slot too short: {len} bytes, need {}", RECORD_LEN)]
    TruncatedRecord { len: usize },
}
