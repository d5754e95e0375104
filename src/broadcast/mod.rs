//! Typed data broadcasting between module instances.
//!
//! Channels are the richer sibling of the workbench topic bus: a producer
//! instance registers a named channel with a declared record shape, then
//! publishes a *generator* rather than data. The generator only runs when a
//! consumer actually listens, its output is verified against the declared
//! shape every time, and late-joining consumers receive the cached snapshot
//! immediately. See [`channel::BroadcastChannel`] for the per-channel state
//! machine.

mod channel;
mod types;

pub use channel::{BroadcastChannel, ChannelSubscription, ChannelUpdate, DataGenerator};
pub use types::{
    BroadcastRecord, ChannelDef, ChannelKeyKind, ChannelMeta, ChannelValueKind, RecordKey,
    RecordValue,
};

use crate::notify::{Signal, Subscription};
use std::cell::RefCell;
use std::rc::Rc;

/// Registry of all live broadcast channels.
pub struct Broadcaster {
    channels: RefCell<Vec<Rc<BroadcastChannel>>>,
    list_signal: Signal<Vec<String>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            channels: RefCell::new(Vec::new()),
            list_signal: Signal::new(),
        }
    }

    /// Create a channel in the unpublished state and notify channel-list
    /// observers.
    pub fn register_channel(
        &self,
        name: impl Into<String>,
        def: ChannelDef,
        owner_instance_id: impl Into<String>,
    ) -> Rc<BroadcastChannel> {
        let channel = BroadcastChannel::new(name.into(), def, owner_instance_id.into());
        tracing::debug!(
            channel = %channel.name(),
            owner = %channel.owner_instance_id(),
            "registered broadcast channel"
        );
        self.channels.borrow_mut().push(channel.clone());
        self.notify_channels_changed();
        channel
    }

    /// Tear down every channel owned by `instance_id`.
    ///
    /// Each removed channel's removal subscribers are notified first, then
    /// the channel is deleted; channel-list observers are notified once at
    /// the end.
    pub fn unregister_channels_for_instance(&self, instance_id: &str) {
        let owned: Vec<Rc<BroadcastChannel>> = self
            .channels
            .borrow()
            .iter()
            .filter(|c| c.owner_instance_id() == instance_id)
            .cloned()
            .collect();
        if owned.is_empty() {
            return;
        }
        for channel in &owned {
            tracing::debug!(channel = %channel.name(), owner = %instance_id, "removing broadcast channel");
            channel.notify_removed();
            self.channels
                .borrow_mut()
                .retain(|c| !Rc::ptr_eq(c, channel));
        }
        self.notify_channels_changed();
    }

    /// Look up a channel by name.
    pub fn channel(&self, name: &str) -> Option<Rc<BroadcastChannel>> {
        self.channels
            .borrow()
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Names of all live channels, in registration order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .borrow()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Observe the channel list. The current list is delivered synchronously
    /// on subscribe, then again on every registration/removal.
    pub fn subscribe_to_channels_changes(
        &self,
        callback: impl Fn(&Vec<String>) + 'static,
    ) -> Subscription {
        let callback: Rc<dyn Fn(&Vec<String>)> = Rc::new(callback);
        let subscription = self.list_signal.subscribe_rc(callback.clone());
        callback(&self.channel_names());
        subscription
    }

    fn notify_channels_changed(&self) {
        self.list_signal.emit(&self.channel_names());
    }
}
