//! Splitting a reassembled payload into protocol records.

use memchr::memmem;
use serde::{Serialize, Serializer};
use std::borrow::Cow;

/// One separator-delimited piece of a session's payload, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolRecord(Vec<u8>);

impl ProtocolRecord {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&[u8]> for ProtocolRecord {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for ProtocolRecord {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl Serialize for ProtocolRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

/// Split `payload` at every occurrence of `separator`.
///
/// An empty payload has no records. Otherwise there is one more record than
/// separators, so a payload ending in the separator ends in an empty record.
pub fn split_records(payload: &[u8], separator: &[u8]) -> Vec<ProtocolRecord> {
    if payload.is_empty() {
        return Vec::new();
    }
    if separator.is_empty() {
        return vec![ProtocolRecord::from(payload)];
    }

    let mut records = Vec::new();
    let mut start = 0;
    for pos in memmem::find_iter(payload, separator) {
        // find_iter never reports overlapping matches
        records.push(ProtocolRecord::from(&payload[start..pos]));
        start = pos + separator.len();
    }
    records.push(ProtocolRecord::from(&payload[start..]));
    records
}
