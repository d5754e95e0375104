//! Channel definitions and record types.
//!
//! Each broadcast channel declares its shape once at registration via a
//! [`ChannelDef`]: the kind of key and the kind of value every record must
//! carry. The declaration is the consumer's contract — generated data is
//! verified against it on every (re)computation, and a violation aborts the
//! broadcast before anything reaches a subscriber.

use crate::error::{Result, WorkbenchError};
use serde::{Deserialize, Serialize};

/// The kind of key a channel's records carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKeyKind {
    /// A single numeric key (e.g. a measured depth or a timestep index).
    Number,
    /// A numeric triple (e.g. an x/y/z position).
    NumberTriplet,
}

/// The kind of value a channel's records carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelValueKind {
    Number,
    String,
}

/// Immutable shape declaration of a channel, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDef {
    pub key_kind: ChannelKeyKind,
    pub value_kind: ChannelValueKind,
}

/// Key of one broadcast record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordKey {
    Number(f64),
    NumberTriplet([f64; 3]),
}

impl RecordKey {
    fn matches(&self, kind: ChannelKeyKind) -> bool {
        matches!(
            (self, kind),
            (RecordKey::Number(_), ChannelKeyKind::Number)
                | (RecordKey::NumberTriplet(_), ChannelKeyKind::NumberTriplet)
        )
    }

    fn kind_name(&self) -> &'static str {
        match self {
            RecordKey::Number(_) => "number",
            RecordKey::NumberTriplet(_) => "number triplet",
        }
    }
}

/// Value of one broadcast record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    Number(f64),
    String(String),
}

impl RecordValue {
    fn matches(&self, kind: ChannelValueKind) -> bool {
        matches!(
            (self, kind),
            (RecordValue::Number(_), ChannelValueKind::Number)
                | (RecordValue::String(_), ChannelValueKind::String)
        )
    }

    fn kind_name(&self) -> &'static str {
        match self {
            RecordValue::Number(_) => "number",
            RecordValue::String(_) => "string",
        }
    }
}

/// One key/value pair produced by a channel's data generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub key: RecordKey,
    pub value: RecordValue,
}

/// Descriptive metadata attached to a broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeta {
    /// Identifier of the ensemble (or equivalent data scope) the records
    /// were computed from.
    pub ensemble: String,
    pub description: String,
    pub unit: String,
}

/// Check every generated record against the channel's declared definition.
///
/// Fails on the first offending record. The error names the channel and the
/// record index so the publishing module can be fixed.
pub(crate) fn verify_generated_data(
    channel: &str,
    def: ChannelDef,
    records: &[BroadcastRecord],
) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        if !record.key.matches(def.key_kind) {
            return Err(WorkbenchError::ChannelSchema {
                channel: channel.to_string(),
                index,
                detail: format!(
                    "key is a {} but the channel declares {:?}",
                    record.key.kind_name(),
                    def.key_kind
                ),
            });
        }
        if !record.value.matches(def.value_kind) {
            return Err(WorkbenchError::ChannelSchema {
                channel: channel.to_string(),
                index,
                detail: format!(
                    "value is a {} but the channel declares {:?}",
                    record.value.kind_name(),
                    def.value_kind
                ),
            });
        }
    }
    Ok(())
}
