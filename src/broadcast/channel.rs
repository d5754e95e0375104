//! A single broadcast channel and its laziness state machine.

use super::types::{verify_generated_data, BroadcastRecord, ChannelDef, ChannelMeta};
use crate::error::{Result, WorkbenchError};
use crate::notify::{Signal, Subscription};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Producer-supplied function that (re)computes a channel's records.
pub type DataGenerator = Box<dyn Fn() -> Vec<BroadcastRecord>>;

/// Payload delivered to data subscribers: the verified records plus the
/// metadata they were broadcast with.
#[derive(Clone)]
pub struct ChannelUpdate {
    pub records: Rc<Vec<BroadcastRecord>>,
    pub meta: ChannelMeta,
}

/// A named, schema-typed conduit from one producer instance to any number of
/// consumer instances.
///
/// Three states, entered in order and only left on removal:
///
/// 1. **Unpublished** — registered, no generator set.
/// 2. **Published, no subscribers** — a generator is stored but never
///    invoked, because nobody is listening. Expensive data generation is
///    skipped entirely for channels nobody observes.
/// 3. **Published, active** — at least one data subscriber; the cache is
///    populated and kept current on every broadcast.
pub struct BroadcastChannel {
    name: String,
    def: ChannelDef,
    owner_instance_id: String,
    generator: RefCell<Option<DataGenerator>>,
    meta: RefCell<Option<ChannelMeta>>,
    cached: RefCell<Option<Rc<Vec<BroadcastRecord>>>>,
    data_signal: Signal<ChannelUpdate>,
    removed_signal: Signal<()>,
}

impl BroadcastChannel {
    pub(crate) fn new(name: String, def: ChannelDef, owner_instance_id: String) -> Rc<Self> {
        Rc::new(Self {
            name,
            def,
            owner_instance_id,
            generator: RefCell::new(None),
            meta: RefCell::new(None),
            cached: RefCell::new(None),
            data_signal: Signal::new(),
            removed_signal: Signal::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn def(&self) -> ChannelDef {
        self.def
    }

    pub fn owner_instance_id(&self) -> &str {
        &self.owner_instance_id
    }

    /// Metadata of the latest broadcast.
    ///
    /// Reading metadata before any broadcast happened is a programmer
    /// mistake on the consuming side and fails loudly.
    pub fn metadata(&self) -> Result<ChannelMeta> {
        self.meta
            .borrow()
            .clone()
            .ok_or_else(|| WorkbenchError::ChannelState {
                channel: self.name.clone(),
                detail: "no metadata available before the first broadcast".to_string(),
            })
    }

    /// Publish a new generator and metadata on this channel.
    ///
    /// The generator and metadata are stored unconditionally, but the
    /// generator is only *invoked* — and its output verified, cached, and
    /// pushed — when at least one data subscriber exists.
    pub fn broadcast(&self, meta: ChannelMeta, generator: DataGenerator) -> Result<()> {
        *self.generator.borrow_mut() = Some(generator);
        *self.meta.borrow_mut() = Some(meta);
        if self.data_signal.subscriber_count() > 0 {
            self.recompute_and_publish()?;
        }
        Ok(())
    }

    /// Subscribe to this channel's data and removal notifications.
    ///
    /// The first data subscriber triggers the deferred computation if a
    /// generator is already set (a `broadcast()` that happened before anyone
    /// listened). A later subscriber receives the cached snapshot
    /// synchronously, so late joiners see the latest data rather than
    /// nothing. If the triggered computation fails verification, the
    /// callbacks are unregistered again and the error is returned.
    pub fn subscribe(
        self: &Rc<Self>,
        on_data: impl Fn(&ChannelUpdate) + 'static,
        on_removed: impl Fn() + 'static,
    ) -> Result<ChannelSubscription> {
        let on_data: Rc<dyn Fn(&ChannelUpdate)> = Rc::new(on_data);
        let first = self.data_signal.subscriber_count() == 0;
        let data = self.data_signal.subscribe_rc(on_data.clone());
        let removed = self.removed_signal.subscribe(move |_| on_removed());

        if first && self.generator.borrow().is_some() {
            if let Err(e) = self.recompute_and_publish() {
                data.unsubscribe();
                removed.unsubscribe();
                return Err(e);
            }
        } else {
            // Late joiner: hand over the cached snapshot, with no borrows
            // held across the callback.
            let cached = self.cached.borrow().clone();
            if let Some(records) = cached {
                let meta = self
                    .meta
                    .borrow()
                    .clone()
                    .expect("cached data implies metadata");
                on_data(&ChannelUpdate { records, meta });
            }
        }

        Ok(ChannelSubscription {
            data,
            removed,
            channel: Rc::downgrade(self),
        })
    }

    pub fn data_subscriber_count(&self) -> usize {
        self.data_signal.subscriber_count()
    }

    /// Invoke the generator, verify its output against the declared
    /// definition, cache it, and push to every data subscriber.
    fn recompute_and_publish(&self) -> Result<()> {
        let records = {
            let generator = self.generator.borrow();
            let Some(generator) = generator.as_ref() else {
                return Ok(());
            };
            generator()
        };
        verify_generated_data(&self.name, self.def, &records)?;

        let records = Rc::new(records);
        *self.cached.borrow_mut() = Some(records.clone());
        let meta = self
            .meta
            .borrow()
            .clone()
            .expect("generator is only set together with metadata");
        self.data_signal.emit(&ChannelUpdate { records, meta });
        Ok(())
    }

    /// Invoked by the broadcaster when the owning instance is torn down.
    pub(crate) fn notify_removed(&self) {
        self.removed_signal.emit(&());
    }

    /// Drop the cache once the last data subscriber is gone; it is only
    /// ever populated while somebody listens.
    fn maybe_release_cache(&self) {
        if self.data_signal.subscriber_count() == 0 {
            self.cached.borrow_mut().take();
        }
    }

    #[cfg(test)]
    pub(crate) fn has_cached_data(&self) -> bool {
        self.cached.borrow().is_some()
    }
}

/// Guard pairing the data and removal callbacks of one channel subscriber.
pub struct ChannelSubscription {
    data: Subscription,
    removed: Subscription,
    channel: Weak<BroadcastChannel>,
}

impl std::fmt::Debug for ChannelSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSubscription").finish_non_exhaustive()
    }
}

impl ChannelSubscription {
    pub fn unsubscribe(self) {
        self.data.unsubscribe();
        self.removed.unsubscribe();
        if let Some(channel) = self.channel.upgrade() {
            channel.maybe_release_cache();
        }
    }
}
