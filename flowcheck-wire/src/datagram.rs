//! Whole-datagram decoding.

use crate::time::{absolute_first_ms, format_timestamp_ms};
use crate::{FlowHeader, FlowRecord, WireError, HEADER_LEN, RECORD_LEN};

/// A decoded datagram: one header and the records it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub header: FlowHeader,
    pub records: Vec<FlowRecord>,
}

impl Datagram {
    /// Build a datagram whose header count matches `records`.
    pub fn new(mut header: FlowHeader, records: Vec<FlowRecord>) -> Self {
        header.count = records.len() as u16;
        Self { header, records }
    }

    /// Encode header and records back-to-back.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.records.len() * RECORD_LEN);
        out.extend_from_slice(&self.header.encode());
        for record in &self.records {
            out.extend_from_slice(&record.encode());
        }
        out
    }
}

/// Decode a datagram and stamp each record with its absolute first-packet
/// time.
///
/// Bytes beyond the declared record count are ignored.
pub fn decode_datagram(data: &[u8]) -> Result<Datagram, WireError> {
    let header = FlowHeader::decode(data)?;

    let count = header.count as usize;
    let needed = HEADER_LEN + count * RECORD_LEN;
    if data.len() < needed {
        return Err(WireError::TruncatedRecords {
            count: header.count,
            len: data.len(),
            needed,
        });
    }

    let mut records = Vec::with_capacity(count);
    for slot in data[HEADER_LEN..needed].chunks_exact(RECORD_LEN) {
        let mut record = FlowRecord::decode(slot)?;
        record.timestamp = Some(format_timestamp_ms(absolute_first_ms(&header, record.first)));
        records.push(record);
    }

    Ok(Datagram { header, records })
}
