//! The workbench facade.
//!
//! A host application constructs exactly one [`Workbench`] at startup and
//! threads its services through to modules — explicit construction and
//! injection, no ambient globals. The workbench also owns the event-loop
//! pump: [`Workbench::tick`] must be called once per host frame to apply
//! finished module loads and elapsed hover throttle windows.

mod services;

pub use services::{topics, WorkbenchServices};

use crate::broadcast::Broadcaster;
use crate::config::WorkbenchConfig;
use crate::hover::HoverService;
use crate::registry::ModuleRegistry;
use serde_json::Value;

/// Owns every cross-module service of one workbench session.
pub struct Workbench {
    registry: ModuleRegistry,
    services: WorkbenchServices,
    broadcaster: Broadcaster,
    hover: HoverService,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(WorkbenchConfig::default())
    }
}

impl Workbench {
    pub fn new(config: WorkbenchConfig) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            services: WorkbenchServices::new(),
            broadcaster: Broadcaster::new(),
            hover: HoverService::new(config.hover),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn services(&self) -> &WorkbenchServices {
        &self.services
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn hover(&self) -> &HoverService {
        &self.hover
    }

    /// Pump the event loop once: apply finished module loads and publish
    /// elapsed hover throttle windows.
    pub fn tick(&self) {
        self.registry.poll_imports();
        self.hover.tick();
    }

    /// Publish on a workbench-internal topic. This is the only route into
    /// the reserved topic family; module code publishes through
    /// [`WorkbenchServices::publish_shared_data`] instead.
    pub fn publish_workbench_data(&self, topic: &str, value: Value) {
        self.services.publish_workbench_data(topic, value);
    }

    /// Tear down cross-module resources held for a disposed instance.
    pub fn dispose_instance(&self, instance_id: &str) {
        tracing::info!(instance = %instance_id, "disposing module instance");
        self.broadcaster.unregister_channels_for_instance(instance_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{ChannelDef, ChannelKeyKind, ChannelValueKind};
    use crate::registry::FnLoader;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_workbench_publish_reaches_reserved_topic() {
        let workbench = Workbench::default();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let _sub = workbench
            .services()
            .subscribe(topics::ACTIVE_MODULE_INSTANCE, move |v| {
                s.borrow_mut().push(v.clone())
            });

        workbench.publish_workbench_data(topics::ACTIVE_MODULE_INSTANCE, json!("map-0"));
        assert_eq!(*seen.borrow(), vec![json!("map-0")]);
    }

    #[test]
    fn test_dispose_instance_tears_down_channels() {
        let workbench = Workbench::default();
        let registry = workbench.registry();
        let descriptor = registry.register_module("map", Box::new(FnLoader(|| Ok(()))));
        let instance = descriptor.make_instance();

        let def = ChannelDef {
            key_kind: ChannelKeyKind::Number,
            value_kind: ChannelValueKind::Number,
        };
        workbench
            .broadcaster()
            .register_channel("depths", def, instance.id());
        workbench
            .broadcaster()
            .register_channel("values", def, instance.id());

        workbench.dispose_instance(instance.id());
        assert!(workbench.broadcaster().channel_names().is_empty());
    }
}
