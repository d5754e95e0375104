//! Cross-module synchronization of transient pointer-hover facts.
//!
//! Spatially-aware modules (maps, cross-sections, logs) share cursor state
//! through hover topics. Each topic tracks two value tiers:
//!
//! - **Immediate** — overwritten synchronously on every update. Read by the
//!   instance that is currently hovering, so the module under the pointer
//!   gets zero-latency feedback.
//! - **Throttled** — updated at most once per throttle window, trailing
//!   edge only: writes inside an open window collapse onto the final one,
//!   which is published when the window elapses. Everyone else reads this
//!   tier and is shielded from update storms.
//!
//! Windows elapse on the host pump ([`HoverService::tick`], called by
//! [`Workbench::tick`](crate::workbench::Workbench::tick)); pending values
//! are deferred, never dropped. [`HoverService::flush_topics`] forces them
//! out early, e.g. on pointer-up, so consumers reconcile before a hover
//! session ends.

use crate::config::HoverConfig;
use crate::notify::{Hub, Subscription};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// Well-known hover topic names.
pub mod hover_topics {
    /// Measured depth along the active well trajectory.
    pub const MD: &str = "hover.md";
    /// World x/y position under the pointer.
    pub const WORLD_POS: &str = "hover.world-pos";
    /// Wellbore under the pointer.
    pub const WELLBORE: &str = "hover.wellbore";
    /// Timestamp under the pointer, UTC epoch milliseconds.
    pub const TIMESTAMP_UTC_MS: &str = "hover.timestamp-utc-ms";
}

struct PendingWrite {
    value: Value,
    due: Instant,
}

#[derive(Default)]
struct TopicRecord {
    immediate: Option<Value>,
    throttled: Option<Value>,
    pending: Option<PendingWrite>,
}

struct HoverInner {
    config: HoverConfig,
    topics: RefCell<HashMap<String, TopicRecord>>,
    last_hovering_instance: RefCell<Option<String>>,
    hub: Hub<String, ()>,
}

/// Dual-rate hover fact synchronization service.
///
/// Cloning produces another handle to the same service.
#[derive(Clone)]
pub struct HoverService {
    inner: Rc<HoverInner>,
}

impl HoverService {
    pub fn new(config: HoverConfig) -> Self {
        Self {
            inner: Rc::new(HoverInner {
                config,
                topics: RefCell::new(HashMap::new()),
                last_hovering_instance: RefCell::new(None),
                hub: Hub::new(),
            }),
        }
    }

    /// Record a hover fact from `instance_id`.
    ///
    /// Writes the immediate tier unconditionally, opens (or feeds) the
    /// topic's throttle window, and synchronously notifies the topic's
    /// subscribers. Which value a subscriber observes depends on the tier
    /// its snapshot getter reads.
    pub fn update_hover_value(&self, topic: &str, value: Value, instance_id: &str) {
        self.update_hover_value_at(topic, value, instance_id, Instant::now());
    }

    fn update_hover_value_at(&self, topic: &str, value: Value, instance_id: &str, now: Instant) {
        *self.inner.last_hovering_instance.borrow_mut() = Some(instance_id.to_string());
        {
            let mut topics = self.inner.topics.borrow_mut();
            let record = topics.entry(topic.to_string()).or_default();
            record.immediate = Some(value.clone());
            match &mut record.pending {
                // Intermediate writes inside the window collapse onto the
                // final one; the deadline stays put (trailing edge).
                Some(pending) => pending.value = value,
                None => {
                    record.pending = Some(PendingWrite {
                        value,
                        due: now + self.inner.config.throttle_window(),
                    })
                }
            }
        }
        self.inner.hub.notify(&topic.to_string(), &());
    }

    /// Value of `topic` as seen by `instance_id`: the immediate tier for the
    /// instance that wrote last (when the policy allows), the throttled tier
    /// for everyone else.
    pub fn topic_value(&self, topic: &str, instance_id: &str) -> Option<Value> {
        let topics = self.inner.topics.borrow();
        let record = topics.get(topic)?;
        let is_hoverer =
            self.inner.last_hovering_instance.borrow().as_deref() == Some(instance_id);
        if is_hoverer && self.inner.config.immediate_for_hovering_instance {
            record.immediate.clone()
        } else {
            record.throttled.clone()
        }
    }

    /// Publish every pending throttled value whose window has elapsed.
    pub fn tick(&self) {
        self.tick_at(Instant::now());
    }

    pub(crate) fn tick_at(&self, now: Instant) {
        let due: Vec<String> = self
            .inner
            .topics
            .borrow()
            .iter()
            .filter(|(_, r)| r.pending.as_ref().is_some_and(|p| p.due <= now))
            .map(|(topic, _)| topic.clone())
            .collect();
        for topic in due {
            self.publish_pending(&topic);
        }
    }

    /// Force the pending throttle timers of the named topics to fire now.
    pub fn flush_topics(&self, topics: &[&str]) {
        for topic in topics {
            self.publish_pending(topic);
        }
    }

    /// Force every pending throttle timer to fire now.
    pub fn flush_all(&self) {
        let pending: Vec<String> = self
            .inner
            .topics
            .borrow()
            .iter()
            .filter(|(_, r)| r.pending.is_some())
            .map(|(topic, _)| topic.clone())
            .collect();
        tracing::debug!(topics = pending.len(), "flushing all hover topics");
        for topic in pending {
            self.publish_pending(&topic);
        }
    }

    /// Register a callback for updates on `topic`; read the current value
    /// through a snapshot getter.
    pub fn subscribe(&self, topic: &str, callback: impl Fn() + 'static) -> Subscription {
        self.inner.hub.subscribe(topic.to_string(), move |_| callback())
    }

    /// Snapshot getter bound to `(topic, instance_id)`, reusable by any
    /// external reactive-read mechanism.
    pub fn make_snapshot_getter(
        &self,
        topic: &str,
        instance_id: &str,
    ) -> impl Fn() -> Option<Value> {
        let service = self.clone();
        let topic = topic.to_string();
        let instance_id = instance_id.to_string();
        move || service.topic_value(&topic, &instance_id)
    }

    fn publish_pending(&self, topic: &str) {
        let fired = {
            let mut topics = self.inner.topics.borrow_mut();
            match topics.get_mut(topic) {
                Some(record) => match record.pending.take() {
                    Some(pending) => {
                        record.throttled = Some(pending.value);
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if fired {
            self.inner.hub.notify(&topic.to_string(), &());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn service_with_window(ms: u64) -> HoverService {
        HoverService::new(HoverConfig {
            throttle_window_ms: ms,
            immediate_for_hovering_instance: true,
        })
    }

    #[test]
    fn test_hoverer_sees_immediate_value() {
        let hover = service_with_window(100);
        hover.update_hover_value(hover_topics::MD, json!(1720.5), "log-0");
        assert_eq!(
            hover.topic_value(hover_topics::MD, "log-0"),
            Some(json!(1720.5))
        );
    }

    #[test]
    fn test_others_see_throttled_value_after_window() {
        let hover = service_with_window(100);
        let start = Instant::now();
        hover.update_hover_value_at(hover_topics::MD, json!(1.0), "log-0", start);

        // Before the window elapses, others still see nothing.
        assert_eq!(hover.topic_value(hover_topics::MD, "map-0"), None);
        hover.tick_at(start + Duration::from_millis(50));
        assert_eq!(hover.topic_value(hover_topics::MD, "map-0"), None);

        hover.tick_at(start + Duration::from_millis(100));
        assert_eq!(hover.topic_value(hover_topics::MD, "map-0"), Some(json!(1.0)));
    }

    #[test]
    fn test_intermediate_writes_collapse_to_final() {
        let hover = service_with_window(100);
        let start = Instant::now();
        hover.update_hover_value_at(hover_topics::MD, json!(1.0), "log-0", start);
        hover.update_hover_value_at(
            hover_topics::MD,
            json!(2.0),
            "log-0",
            start + Duration::from_millis(30),
        );
        hover.update_hover_value_at(
            hover_topics::MD,
            json!(3.0),
            "log-0",
            start + Duration::from_millis(60),
        );

        let notified = Rc::new(RefCell::new(0));
        let n = notified.clone();
        let _sub = hover.subscribe(hover_topics::MD, move || *n.borrow_mut() += 1);

        hover.tick_at(start + Duration::from_millis(100));
        assert_eq!(hover.topic_value(hover_topics::MD, "map-0"), Some(json!(3.0)));
        // One trailing publication for the whole window.
        assert_eq!(*notified.borrow(), 1);
    }

    #[test]
    fn test_flush_forces_pending_value_out() {
        let hover = service_with_window(10_000);
        hover.update_hover_value(hover_topics::WORLD_POS, json!([12.0, 34.0]), "map-0");
        assert_eq!(hover.topic_value(hover_topics::WORLD_POS, "section-0"), None);

        hover.flush_topics(&[hover_topics::WORLD_POS]);
        assert_eq!(
            hover.topic_value(hover_topics::WORLD_POS, "section-0"),
            Some(json!([12.0, 34.0]))
        );
    }

    #[test]
    fn test_flush_all_covers_every_pending_topic() {
        let hover = service_with_window(10_000);
        hover.update_hover_value(hover_topics::MD, json!(1.0), "log-0");
        hover.update_hover_value(hover_topics::WELLBORE, json!("25/8-5"), "log-0");

        hover.flush_all();
        assert_eq!(hover.topic_value(hover_topics::MD, "map-0"), Some(json!(1.0)));
        assert_eq!(
            hover.topic_value(hover_topics::WELLBORE, "map-0"),
            Some(json!("25/8-5"))
        );
    }

    #[test]
    fn test_policy_disabled_gives_hoverer_throttled_tier() {
        let hover = HoverService::new(HoverConfig {
            throttle_window_ms: 10_000,
            immediate_for_hovering_instance: false,
        });
        hover.update_hover_value(hover_topics::MD, json!(5.0), "log-0");
        assert_eq!(hover.topic_value(hover_topics::MD, "log-0"), None);

        hover.flush_all();
        assert_eq!(hover.topic_value(hover_topics::MD, "log-0"), Some(json!(5.0)));
    }

    #[test]
    fn test_hover_handoff_between_instances() {
        let hover = service_with_window(10_000);
        hover.update_hover_value(hover_topics::MD, json!(1.0), "log-0");
        hover.flush_all();
        hover.update_hover_value(hover_topics::MD, json!(2.0), "map-0");

        // The new hoverer reads immediately; the previous one falls back to
        // the throttled tier.
        assert_eq!(hover.topic_value(hover_topics::MD, "map-0"), Some(json!(2.0)));
        assert_eq!(hover.topic_value(hover_topics::MD, "log-0"), Some(json!(1.0)));
    }

    #[test]
    fn test_snapshot_getter_tracks_service() {
        let hover = service_with_window(10_000);
        let getter = hover.make_snapshot_getter(hover_topics::MD, "log-0");
        assert_eq!(getter(), None);

        hover.update_hover_value(hover_topics::MD, json!(9.5), "log-0");
        assert_eq!(getter(), Some(json!(9.5)));
    }
}
