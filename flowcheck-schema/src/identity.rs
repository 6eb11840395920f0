//! Content-derived record identity.
//!
//! A record's base key is a SHA-256 digest over its flow tuple. Records that
//! share a base key are kept apart by a numeric suffix assigned in arrival
//! order: the first keeps the bare base, later ones get `_1`, `_2`, ...

use std::fmt;
use std::str::FromStr;

use flowcheck_wire::FlowRecord;
use sha2::{Digest, Sha256};

use crate::CaptureDocument;

/// Which record fields feed the base key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IdentityScheme {
    /// (src addr, dst addr, src port, dst port)
    #[default]
    FourTuple,
    /// Four-tuple plus packets, octets and TCP flags. Separates repeated
    /// flows that share a four-tuple but carry different payloads.
    Extended,
}

impl IdentityScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityScheme::FourTuple => "four-tuple",
            IdentityScheme::Extended => "extended",
        }
    }
}

impl fmt::Display for IdentityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "four-tuple" => Ok(IdentityScheme::FourTuple),
            "extended" => Ok(IdentityScheme::Extended),
            other => Err(format!(
                "unknown identity scheme '{}', expected 'four-tuple' or 'extended'",
                other
            )),
        }
    }
}

/// A collision-resolved record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The base key this key belongs to, with any numeric suffix removed.
    pub fn base(&self) -> &str {
        family_base(&self.0)
    }

    /// Numeric suffix, if the key was disambiguated.
    pub fn suffix(&self) -> Option<usize> {
        self.0
            .rsplit_once('_')
            .and_then(|(_, n)| n.parse().ok())
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a trailing `_<digits>` suffix.
pub(crate) fn family_base(key: &str) -> &str {
    match key.rsplit_once('_') {
        Some((base, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => key,
    }
}

/// Assigns identity keys to records as they arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAssigner {
    scheme: IdentityScheme,
}

impl IdentityAssigner {
    pub fn new(scheme: IdentityScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    /// Hex SHA-256 of the record's tuple, big-endian field bytes in order.
    pub fn base_key(&self, record: &FlowRecord) -> String {
        let mut hasher = Sha256::new();
        hasher.update(record.src_addr.octets());
        hasher.update(record.dst_addr.octets());
        hasher.update(record.src_port.to_be_bytes());
        hasher.update(record.dst_port.to_be_bytes());

        if self.scheme == IdentityScheme::Extended {
            hasher.update(record.packets.to_be_bytes());
            hasher.update(record.octets.to_be_bytes());
            hasher.update([record.tcp_flags]);
        }

        hex::encode(hasher.finalize())
    }

    /// Key for `record` given what `document` already holds.
    ///
    /// If the base key is taken, the suffix is the number of entries already
    /// stored under the base or any `base_<n>`.
    pub fn assign(&self, record: &FlowRecord, document: &CaptureDocument) -> IdentityKey {
        let base = self.base_key(record);
        if !document.contains_key(&base) {
            return IdentityKey(base);
        }

        let count = document.family_size(&base);
        IdentityKey(format!("{}_{}", base, count))
    }
}
