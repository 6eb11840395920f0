//! Capture document.
//!
//! Holds every header and record received during one capture session, in
//! arrival order. The persisted JSON form is:
//!
//! ```json
//! { "headers": { "header_0": { ... }, ... },
//!   "records": { "<identity key>": { ... }, ... } }
//! ```
//!
//! with records written in ascending key order.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use flowcheck_wire::{Datagram, FlowHeader, FlowRecord};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::family_base;
use crate::{IdentityAssigner, IdentityKey};

/// Errors from building or parsing a capture document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("record key already present: {0}")]
    DuplicateKey(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Headers and identity-keyed records from one capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDocument {
    headers: Vec<FlowHeader>,
    records: Vec<(String, FlowRecord)>,
    index: HashMap<String, usize>,
    /// Entries per base key (bare key plus suffixed ones).
    families: HashMap<String, usize>,
}

impl CaptureDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header and return its synthetic index.
    pub fn push_header(&mut self, header: FlowHeader) -> usize {
        self.headers.push(header);
        self.headers.len() - 1
    }

    /// Store `record` under `key`. An existing key is never overwritten.
    pub fn insert_record(&mut self, key: IdentityKey, record: FlowRecord) -> Result<(), SchemaError> {
        let key = key.into_string();
        if self.index.contains_key(&key) {
            return Err(SchemaError::DuplicateKey(key));
        }

        *self.families.entry(family_base(&key).to_string()).or_insert(0) += 1;
        self.index.insert(key.clone(), self.records.len());
        self.records.push((key, record));
        Ok(())
    }

    /// Assign `record` a key against the current contents and store it.
    pub fn insert_assigned(
        &mut self,
        assigner: &IdentityAssigner,
        record: FlowRecord,
    ) -> Result<IdentityKey, SchemaError> {
        let key = assigner.assign(&record, self);
        self.insert_record(key.clone(), record)?;
        Ok(key)
    }

    /// Fold a decoded datagram in: one header entry, then each record in
    /// slot order. Returns the keys assigned.
    pub fn ingest(
        &mut self,
        assigner: &IdentityAssigner,
        datagram: Datagram,
    ) -> Result<Vec<IdentityKey>, SchemaError> {
        self.push_header(datagram.header);
        datagram
            .records
            .into_iter()
            .map(|record| self.insert_assigned(assigner, record))
            .collect()
    }

    pub fn headers(&self) -> &[FlowHeader] {
        &self.headers
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.records.is_empty()
    }

    /// Records in document order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &FlowRecord)> {
        self.records.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&FlowRecord> {
        self.index.get(key).map(|&i| &self.records[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of stored keys equal to `base` or of the form `base_<n>`.
    pub fn family_size(&self, base: &str) -> usize {
        self.families.get(base).copied().unwrap_or(0)
    }

    /// Copy of this document with records in ascending key order.
    pub fn sorted(&self) -> Self {
        let mut records = self.records.clone();
        records.sort_by(|a, b| a.0.cmp(&b.0));

        let index = records
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();

        Self {
            headers: self.headers.clone(),
            records,
            index,
            families: self.families.clone(),
        }
    }

    /// Pretty JSON with records in ascending key order.
    pub fn to_json(&self) -> String {
        let sorted = self.sorted();
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        // Headers and records are plain integers, strings and addresses.
        sorted
            .serialize(&mut ser)
            .expect("CaptureDocument serialization cannot fail");
        String::from_utf8(out).expect("serde_json emits UTF-8")
    }

    /// Parse a persisted document, keeping the file's entry order.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let raw: RawDocument = serde_json::from_str(json)?;

        let mut document = CaptureDocument::new();
        for (_, header) in raw.headers.0 {
            document.push_header(header);
        }
        for (key, record) in raw.records.0 {
            document.insert_record(IdentityKey::new(key), record)?;
        }
        Ok(document)
    }
}

impl Serialize for CaptureDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("headers", &HeaderEntries(&self.headers))?;
        map.serialize_entry("records", &RecordEntries(&self.records))?;
        map.end()
    }
}

struct HeaderEntries<'a>(&'a [FlowHeader]);

impl Serialize for HeaderEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, header) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("header_{}", i), header)?;
        }
        map.end()
    }
}

struct RecordEntries<'a>(&'a [(String, FlowRecord)]);

impl Serialize for RecordEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, record) in self.0 {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    headers: OrderedEntries<FlowHeader>,
    #[serde(default)]
    records: OrderedEntries<FlowRecord>,
}

/// JSON object entries in the order they appear in the file.
struct OrderedEntries<T>(Vec<(String, T)>);

impl<T> Default for OrderedEntries<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of named entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
