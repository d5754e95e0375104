//! Test data builders for creating test objects

use modviz_rs::broadcast::{
    BroadcastRecord, ChannelDef, ChannelKeyKind, ChannelMeta, ChannelValueKind, RecordKey,
    RecordValue,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Builder for channel definitions
pub struct ChannelDefBuilder {
    key_kind: ChannelKeyKind,
    value_kind: ChannelValueKind,
}

impl ChannelDefBuilder {
    pub fn new() -> Self {
        Self {
            key_kind: ChannelKeyKind::Number,
            value_kind: ChannelValueKind::Number,
        }
    }

    pub fn key_kind(mut self, kind: ChannelKeyKind) -> Self {
        self.key_kind = kind;
        self
    }

    pub fn value_kind(mut self, kind: ChannelValueKind) -> Self {
        self.value_kind = kind;
        self
    }

    pub fn build(self) -> ChannelDef {
        ChannelDef {
            key_kind: self.key_kind,
            value_kind: self.value_kind,
        }
    }
}

impl Default for ChannelDefBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata filled with plausible test values
pub fn test_meta(description: &str) -> ChannelMeta {
    ChannelMeta {
        ensemble: "iter-0".to_string(),
        description: description.to_string(),
        unit: "m".to_string(),
    }
}

/// A small number→number record set
pub fn number_records(n: usize) -> Vec<BroadcastRecord> {
    (0..n)
        .map(|i| BroadcastRecord {
            key: RecordKey::Number(1700.0 + i as f64 * 10.0),
            value: RecordValue::Number(0.2 + i as f64 * 0.01),
        })
        .collect()
}

/// Counts how many times a wrapped generator has been invoked
#[derive(Clone, Default)]
pub struct GeneratorCounter {
    calls: Rc<RefCell<usize>>,
}

impl GeneratorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    /// Wrap a record set into a counting generator
    pub fn counting(&self, records: Vec<BroadcastRecord>) -> Box<dyn Fn() -> Vec<BroadcastRecord>> {
        let calls = self.calls.clone();
        Box::new(move || {
            *calls.borrow_mut() += 1;
            records.clone()
        })
    }
}
