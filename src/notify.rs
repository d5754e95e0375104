//! Shared subscribe/notify primitive.
//!
//! Every reactive surface in this crate (store keys, import states, channel
//! data, hover topics, status fields) is built on the same mechanism: a
//! key → ordered callback list with synchronous fan-out in subscription
//! order. It is factored out once here instead of being re-derived per
//! component.
//!
//! The hub is single-threaded: handles are cheap `Rc` clones and callbacks
//! run inline on the calling turn. Fan-out snapshots the callback list
//! before invoking, so a callback may subscribe or unsubscribe without
//! corrupting the iteration.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

struct Entry<V> {
    id: u64,
    callback: Rc<dyn Fn(&V)>,
}

struct HubInner<K, V> {
    next_id: u64,
    topics: HashMap<K, Vec<Entry<V>>>,
}

/// Key-addressed publish/subscribe hub with synchronous in-order fan-out.
pub struct Hub<K, V> {
    inner: Rc<RefCell<HubInner<K, V>>>,
}

impl<K, V> Clone for Hub<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Default for Hub<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Hub<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(HubInner {
                next_id: 0,
                topics: HashMap::new(),
            })),
        }
    }

    /// Register a callback for `key`. Invocation order per key is
    /// subscription order.
    pub fn subscribe(&self, key: K, callback: impl Fn(&V) + 'static) -> Subscription {
        self.subscribe_rc(key, Rc::new(callback))
    }

    /// Same as [`Hub::subscribe`], but the caller keeps a handle to the
    /// callback (used to deliver a cached snapshot to only the new
    /// subscriber).
    pub fn subscribe_rc(&self, key: K, callback: Rc<dyn Fn(&V)>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .topics
                .entry(key.clone())
                .or_default()
                .push(Entry { id, callback });
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                remove_entry(&inner, &key, id);
            }
        })
    }

    /// Synchronously invoke every callback registered for `key`.
    ///
    /// The callback list is snapshotted first; mutations made by callbacks
    /// take effect for the *next* notification.
    pub fn notify(&self, key: &K, value: &V) {
        let snapshot: Vec<Rc<dyn Fn(&V)>> = {
            let inner = self.inner.borrow();
            match inner.topics.get(key) {
                Some(entries) => entries.iter().map(|e| e.callback.clone()).collect(),
                None => return,
            }
        };
        for callback in snapshot {
            callback(value);
        }
    }

    pub fn subscriber_count(&self, key: &K) -> usize {
        self.inner
            .borrow()
            .topics
            .get(key)
            .map_or(0, |entries| entries.len())
    }
}

fn remove_entry<K, V>(inner: &Rc<RefCell<HubInner<K, V>>>, key: &K, id: u64)
where
    K: Eq + Hash,
{
    let mut inner = inner.borrow_mut();
    if let Some(entries) = inner.topics.get_mut(key) {
        entries.retain(|e| e.id != id);
        if entries.is_empty() {
            inner.topics.remove(key);
        }
    }
}

/// Single-topic convenience wrapper over [`Hub`].
pub struct Signal<V> {
    hub: Hub<(), V>,
}

impl<V> Clone for Signal<V> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
        }
    }
}

impl<V: 'static> Default for Signal<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> Signal<V> {
    pub fn new() -> Self {
        Self { hub: Hub::new() }
    }

    pub fn subscribe(&self, callback: impl Fn(&V) + 'static) -> Subscription {
        self.hub.subscribe((), callback)
    }

    pub fn subscribe_rc(&self, callback: Rc<dyn Fn(&V)>) -> Subscription {
        self.hub.subscribe_rc((), callback)
    }

    pub fn emit(&self, value: &V) {
        self.hub.notify(&(), value);
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count(&())
    }
}

/// Guard returned at subscribe time.
///
/// Removal is explicit: dropping the guard without calling
/// [`Subscription::unsubscribe`] leaves the callback registered for the
/// lifetime of the hub.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the callback this guard was issued for. A no-op if the hub is
    /// already gone.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fanout_in_subscription_order() {
        let hub: Hub<String, i32> = Hub::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s1 = seen.clone();
        let _a = hub.subscribe("k".to_string(), move |v| s1.borrow_mut().push(("a", *v)));
        let s2 = seen.clone();
        let _b = hub.subscribe("k".to_string(), move |v| s2.borrow_mut().push(("b", *v)));

        hub.notify(&"k".to_string(), &1);
        hub.notify(&"k".to_string(), &2);

        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn test_notify_is_per_key() {
        let hub: Hub<String, i32> = Hub::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let _sub = hub.subscribe("x".to_string(), move |_| *c.borrow_mut() += 1);

        hub.notify(&"y".to_string(), &0);
        assert_eq!(*count.borrow(), 0);

        hub.notify(&"x".to_string(), &0);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe_removes_callback() {
        let hub: Hub<&'static str, ()> = Hub::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let sub = hub.subscribe("k", move |_| *c.borrow_mut() += 1);
        hub.notify(&"k", &());
        sub.unsubscribe();
        hub.notify(&"k", &());

        assert_eq!(*count.borrow(), 1);
        assert_eq!(hub.subscriber_count(&"k"), 0);
    }

    #[test]
    fn test_unsubscribe_during_fanout_does_not_disturb_snapshot() {
        let hub: Hub<&'static str, ()> = Hub::new();
        let count = Rc::new(RefCell::new(0));

        let sub_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let slot = sub_slot.clone();
        let _first = hub.subscribe("k", move |_| {
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let c = count.clone();
        let second = hub.subscribe("k", move |_| *c.borrow_mut() += 1);
        *sub_slot.borrow_mut() = Some(second);

        // Second callback still sees this notification (snapshot), not the next.
        hub.notify(&"k", &());
        assert_eq!(*count.borrow(), 1);
        hub.notify(&"k", &());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_signal_roundtrip() {
        let signal: Signal<u32> = Signal::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let sub = signal.subscribe(move |v| s.borrow_mut().push(*v));
        assert_eq!(signal.subscriber_count(), 1);

        signal.emit(&7);
        sub.unsubscribe();
        signal.emit(&8);

        assert_eq!(*seen.borrow(), vec![7]);
        assert_eq!(signal.subscriber_count(), 0);
    }
}
