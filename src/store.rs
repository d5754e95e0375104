//! Per-module-instance keyed state storage.
//!
//! Every module instance owns exactly one [`KeyedStateStore`]: a string-keyed
//! map of arbitrary JSON values with per-key subscriber lists. It is the
//! foundation the per-instance mechanisms are built on — the module's own
//! view/settings code reads and writes it through the instance's
//! [`ModuleContext`](crate::registry::ModuleContext), and the session
//! persistence layer periodically reads the serialized snapshot.
//!
//! Writes fan out synchronously to that key's subscribers in subscription
//! order. There is no ordering guarantee across different keys.

use crate::notify::{Hub, Subscription};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct StoreInner {
    state: RefCell<HashMap<String, Value>>,
    hub: Hub<String, Value>,
}

/// String-keyed value store with per-key subscribers.
///
/// Cloning produces another handle to the same store.
#[derive(Clone)]
pub struct KeyedStateStore {
    inner: Rc<StoreInner>,
}

impl Default for KeyedStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedStateStore {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(HashMap::new()),
                hub: Hub::new(),
            }),
        }
    }

    /// Whether `key` has ever been written.
    pub fn has_state(&self, key: &str) -> bool {
        self.inner.state.borrow().contains_key(key)
    }

    /// Current value of `key`, or `None` if it was never written.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.inner.state.borrow().get(key).cloned()
    }

    /// Current value of `key`, initializing it to `default` on first read.
    ///
    /// The lazy initialization is a write-once default and does not notify
    /// subscribers; only [`KeyedStateStore::set_state`] fans out.
    pub fn state_or_init(&self, key: &str, default: Value) -> Value {
        self.inner
            .state
            .borrow_mut()
            .entry(key.to_string())
            .or_insert(default)
            .clone()
    }

    /// Write `value` under `key`, then synchronously invoke every subscriber
    /// registered for that key with the new value.
    pub fn set_state(&self, key: &str, value: Value) {
        self.inner
            .state
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        self.inner.hub.notify(&key.to_string(), &value);
    }

    /// Register a callback invoked on every subsequent write to `key`.
    pub fn subscribe(&self, key: &str, callback: impl Fn(&Value) + 'static) -> Subscription {
        self.inner.hub.subscribe(key.to_string(), callback)
    }

    /// Snapshot of the whole store for the session persistence consumer.
    pub fn serialized(&self) -> serde_json::Map<String, Value> {
        self.inner
            .state
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
