//! Flow record slots.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::WireError;

/// Size of one record slot in bytes.
pub const RECORD_LEN: usize = 48;

/// One exported flow.
///
/// `duration` is derived at decode time as `last - first` in 32-bit tick
/// space and is not part of the wire layout. `timestamp` is the rendered
/// absolute first-packet time, present when the record was decoded with its
/// header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(rename = "Timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "SrcAddr")]
    pub src_addr: Ipv4Addr,
    #[serde(rename = "DstAddr")]
    pub dst_addr: Ipv4Addr,
    #[serde(rename = "NextHop")]
    pub next_hop: Ipv4Addr,
    #[serde(rename = "Input")]
    pub input: u16,
    #[serde(rename = "Output")]
    pub output: u16,
    #[serde(rename = "Packets")]
    pub packets: u32,
    #[serde(rename = "Octets")]
    pub octets: u32,
    #[serde(rename = "First")]
    pub first: u32,
    #[serde(rename = "Last")]
    pub last: u32,
    #[serde(rename = "Duration")]
    pub duration: u32,
    #[serde(rename = "SrcPort")]
    pub src_port: u16,
    #[serde(rename = "DstPort")]
    pub dst_port: u16,
    #[serde(rename = "Padding")]
    pub pad1: u8,
    #[serde(rename = "TCPFlags")]
    pub tcp_flags: u8,
    #[serde(rename = "Protocol")]
    pub protocol: u8,
    #[serde(rename = "Tos")]
    pub tos: u8,
    #[serde(rename = "SrcAS")]
    pub src_as: u16,
    #[serde(rename = "DstAS")]
    pub dst_as: u16,
    #[serde(rename = "SrcMask")]
    pub src_mask: u8,
    #[serde(rename = "DstMask")]
    pub dst_mask: u8,
    #[serde(rename = "Padding2")]
    pub pad2: u16,
}

impl Default for FlowRecord {
    fn default() -> Self {
        Self {
            timestamp: None,
            src_addr: Ipv4Addr::UNSPECIFIED,
            dst_addr: Ipv4Addr::UNSPECIFIED,
            next_hop: Ipv4Addr::UNSPECIFIED,
            input: 0,
            output: 0,
            packets: 0,
            octets: 0,
            first: 0,
            last: 0,
            duration: 0,
            src_port: 0,
            dst_port: 0,
            pad1: 0,
            tcp_flags: 0,
            protocol: 0,
            tos: 0,
            src_as: 0,
            dst_as: 0,
            src_mask: 0,
            dst_mask: 0,
            pad2: 0,
        }
    }
}

impl FlowRecord {
    /// Decode one 48-byte slot. Bytes past the slot are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < RECORD_LEN {
            return Err(WireError::TruncatedRecord { len: data.len() });
        }

        let u32_at = |i: usize| u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        let u16_at = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);

        let first = u32_at(24);
        let last = u32_at(28);

        Ok(Self {
            timestamp: None,
            src_addr: Ipv4Addr::from(u32_at(0)),
            dst_addr: Ipv4Addr::from(u32_at(4)),
            next_hop: Ipv4Addr::from(u32_at(8)),
            input: u16_at(12),
            output: u16_at(14),
            packets: u32_at(16),
            octets: u32_at(20),
            first,
            last,
            duration: tick_duration(first, last),
            src_port: u16_at(32),
            dst_port: u16_at(34),
            pad1: data[36],
            tcp_flags: data[37],
            protocol: data[38],
            tos: data[39],
            src_as: u16_at(40),
            dst_as: u16_at(42),
            src_mask: data[44],
            dst_mask: data[45],
            pad2: u16_at(46),
        })
    }

    /// Encode the 20 raw fields into a 48-byte slot.
    ///
    /// `duration` and `timestamp` are derived and not written.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[0..4].copy_from_slice(&u32::from(self.src_addr).to_be_bytes());
        out[4..8].copy_from_slice(&u32::from(self.dst_addr).to_be_bytes());
        out[8..12].copy_from_slice(&u32::from(self.next_hop).to_be_bytes());
        out[12..14].copy_from_slice(&self.input.to_be_bytes());
        out[14..16].copy_from_slice(&self.output.to_be_bytes());
        out[16..20].copy_from_slice(&self.packets.to_be_bytes());
        out[20..24].copy_from_slice(&self.octets.to_be_bytes());
        out[24..28].copy_from_slice(&self.first.to_be_bytes());
        out[28..32].copy_from_slice(&self.last.to_be_bytes());
        out[32..34].copy_from_slice(&self.src_port.to_be_bytes());
        out[34..36].copy_from_slice(&self.dst_port.to_be_bytes());
        out[36] = self.pad1;
        out[37] = self.tcp_flags;
        out[38] = self.protocol;
        out[39] = self.tos;
        out[40..42].copy_from_slice(&self.src_as.to_be_bytes());
        out[42..44].copy_from_slice(&self.dst_as.to_be_bytes());
        out[44] = self.src_mask;
        out[45] = self.dst_mask;
        out[46..48].copy_from_slice(&self.pad2.to_be_bytes());
        out
    }

    /// Set `first`/`last` and recompute `duration`.
    pub fn with_ticks(mut self, first: u32, last: u32) -> Self {
        self.first = first;
        self.last = last;
        self.duration = tick_duration(first, last);
        self
    }
}

/// `last - first` in wrapping 32-bit tick space.
fn tick_duration(first: u32, last: u32) -> u32 {
    last.wrapping_sub(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FlowRecord {
        FlowRecord {
            src_addr: Ipv4Addr::new(192, 168, 1, 10),
            dst_addr: Ipv4Addr::new(10, 0, 0, 1),
            next_hop: Ipv4Addr::new(172, 16, 0, 254),
            input: 3,
            output: 4,
            packets: 12,
            octets: 4096,
            src_port: 51514,
            dst_port: 443,
            pad1: 0,
            tcp_flags: 0x1B,
            protocol: 6,
            tos: 0x10,
            src_as: 64512,
            dst_as: 15169,
            src_mask: 24,
            dst_mask: 8,
            pad2: 0,
            ..Default::default()
        }
        .with_ticks(1_000, 3_500)
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let bytes = record.encode();
        assert_eq!(FlowRecord::decode(&bytes).expect("decode"), record);
    }

    #[test]
    fn test_record_roundtrip_preserves_padding() {
        let mut record = sample_record();
        record.pad1 = 0xAB;
        record.pad2 = 0xCDEF;
        let decoded = FlowRecord::decode(&record.encode()).expect("decode");
        assert_eq!(decoded.pad1, 0xAB);
        assert_eq!(decoded.pad2, 0xCDEF);
    }

    #[test]
    fn test_record_field_offsets() {
        let bytes = sample_record().encode();
        assert_eq!(&bytes[0..4], &[192, 168, 1, 10]);
        assert_eq!(&bytes[4..8], &[10, 0, 0, 1]);
        assert_eq!(&bytes[32..34], &51514u16.to_be_bytes());
        assert_eq!(&bytes[34..36], &443u16.to_be_bytes());
        assert_eq!(bytes[37], 0x1B);
        assert_eq!(bytes[38], 6);
        assert_eq!(bytes[44], 24);
        assert_eq!(bytes[45], 8);
    }

    #[test]
    fn test_record_too_short() {
        let err = FlowRecord::decode(&[0u8; 47]).unwrap_err();
        assert_eq!(err, WireError::TruncatedRecord { len: 47 });
    }

    #[test]
    fn test_duration_single_packet_flow() {
        let record = FlowRecord::default().with_ticks(1000, 1000);
        assert_eq!(record.duration, 0);
    }

    #[test]
    fn test_duration_wraps_around_tick_counter() {
        let record = FlowRecord::default().with_ticks(4_294_966_296, 500);
        assert_eq!(record.duration, 1500);
    }

    #[test]
    fn test_decode_computes_duration() {
        let mut record = sample_record();
        record.first = 4_294_966_296;
        record.last = 500;
        let decoded = FlowRecord::decode(&record.encode()).expect("decode");
        assert_eq!(decoded.duration, 1500);
    }

    #[test]
    fn test_record_json_renders_dotted_quad() {
        let json = serde_json::to_value(sample_record()).expect("serialize");
        assert_eq!(json["SrcAddr"], "192.168.1.10");
        assert_eq!(json["DstAddr"], "10.0.0.1");
        assert_eq!(json["NextHop"], "172.16.0.254");
        assert_eq!(json["Duration"], 2500);
        assert_eq!(json["TCPFlags"], 0x1B);
        assert!(json.get("Timestamp").is_none());
    }

    #[test]
    fn test_record_json_roundtrip_with_timestamp() {
        let mut record = sample_record();
        record.timestamp = Some("2024-10-31 15:00:00.400".to_string());
        let json = serde_json::to_string(&record).expect("serialize");
        let restored: FlowRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, record);
    }
}
