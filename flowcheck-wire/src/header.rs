//! Datagram header.

use serde::{Deserialize, Serialize};

use crate::WireError;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 24;

/// Version number carried by NetFlow v5 exporters.
pub const NETFLOW_V5_VERSION: u16 = 5;

/// Header of one exported datagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowHeader {
    #[serde(rename = "Version")]
    pub version: u16,
    #[serde(rename = "Count")]
    pub count: u16,
    /// Milliseconds since the exporting device booted.
    #[serde(rename = "SysUptime")]
    pub sys_uptime: u32,
    #[serde(rename = "UnixSecs")]
    pub unix_secs: u32,
    #[serde(rename = "UnixNsecs")]
    pub unix_nsecs: u32,
    /// Sequence counter of total flows seen by the exporter.
    #[serde(rename = "FlowSequence")]
    pub flow_sequence: u32,
    #[serde(rename = "EngineType")]
    pub engine_type: u8,
    #[serde(rename = "EngineID")]
    pub engine_id: u8,
    #[serde(rename = "SamplingInterval")]
    pub sampling_interval: u16,
}

impl FlowHeader {
    /// Decode the first 24 bytes of `data`.
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < HEADER_LEN {
            return Err(WireError::TruncatedHeader { len: data.len() });
        }

        Ok(Self {
            version: u16::from_be_bytes([data[0], data[1]]),
            count: u16::from_be_bytes([data[2], data[3]]),
            sys_uptime: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            unix_secs: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            unix_nsecs: u32::from_be_bytes([data[12], data[13], data[14], data[15]]),
            flow_sequence: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
            engine_type: data[20],
            engine_id: data[21],
            sampling_interval: u16::from_be_bytes([data[22], data[23]]),
        })
    }

    /// Encode into the 24-byte wire layout.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..2].copy_from_slice(&self.version.to_be_bytes());
        out[2..4].copy_from_slice(&self.count.to_be_bytes());
        out[4..8].copy_from_slice(&self.sys_uptime.to_be_bytes());
        out[8..12].copy_from_slice(&self.unix_secs.to_be_bytes());
        out[12..16].copy_from_slice(&self.unix_nsecs.to_be_bytes());
        out[16..20].copy_from_slice(&self.flow_sequence.to_be_bytes());
        out[20] = self.engine_type;
        out[21] = self.engine_id;
        out[22..24].copy_from_slice(&self.sampling_interval.to_be_bytes());
        out
    }

    /// Export wall-clock time in milliseconds since the Unix epoch.
    pub fn export_ms(&self) -> i64 {
        self.unix_secs as i64 * 1000 + (self.unix_nsecs / 1_000_000) as i64
    }
}
