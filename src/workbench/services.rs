//! Global topic-keyed publish/subscribe bus.
//!
//! Two disjoint topic families share one subscription mechanism:
//!
//! - **Shared-data topics** — publishable by any module via
//!   [`WorkbenchServices::publish_shared_data`].
//! - **Workbench topics** (under the [`topics::WORKBENCH_PREFIX`] prefix) —
//!   published only by the hosting workbench. The publishing entry point is
//!   crate-private and re-exposed through the
//!   [`Workbench`](crate::workbench::Workbench) facade, so module code
//!   cannot reach it.
//!
//! There is no queuing and no replay: a subscriber that joins after a
//! publish sees nothing until the next publish on that exact topic string.

use crate::notify::{Hub, Subscription};
use serde_json::Value;

/// Well-known topic names.
pub mod topics {
    /// Prefix reserved for the workbench-internal topic family.
    pub const WORKBENCH_PREFIX: &str = "workbench.";

    // --- Shared-data topics (modules may publish) ---
    /// The set of ensembles currently selected for the session.
    pub const ENSEMBLE_SET: &str = "ensemble-set";
    /// Cross-module data filter selection.
    pub const DATA_FILTER: &str = "data-filter";
    /// Currently selected timestamp, UTC epoch milliseconds.
    pub const TIMESTAMP_UTC_MS: &str = "timestamp-utc-ms";

    // --- Workbench topics (host only) ---
    /// Id of the module instance that currently has focus.
    pub const ACTIVE_MODULE_INSTANCE: &str = "workbench.active-module-instance";
    /// Whether the settings drawer is open, and for which instance.
    pub const SETTINGS_DRAWER: &str = "workbench.settings-drawer";
}

/// The global pub/sub bus shared by all module instances.
#[derive(Clone, Default)]
pub struct WorkbenchServices {
    hub: Hub<String, Value>,
}

impl WorkbenchServices {
    pub fn new() -> Self {
        Self { hub: Hub::new() }
    }

    /// Register a callback for every subsequent publish on `topic`.
    pub fn subscribe(&self, topic: &str, callback: impl Fn(&Value) + 'static) -> Subscription {
        self.hub.subscribe(topic.to_string(), callback)
    }

    /// Publish on a shared-data topic, synchronously notifying every
    /// currently-registered callback in subscription order.
    ///
    /// # Panics
    ///
    /// Panics when `topic` lies in the reserved workbench family; modules
    /// must not publish there.
    pub fn publish_shared_data(&self, topic: &str, value: Value) {
        assert!(
            !topic.starts_with(topics::WORKBENCH_PREFIX),
            "topic '{}' is reserved for the workbench",
            topic
        );
        self.hub.notify(&topic.to_string(), &value);
    }

    /// Publish on a workbench topic. Only reachable by the hosting
    /// workbench, via the facade.
    pub(crate) fn publish_workbench_data(&self, topic: &str, value: Value) {
        self.hub.notify(&topic.to_string(), &value);
    }
}
