//! Running module instances and their scoped contexts.

use super::descriptor::{ImportState, ModuleDescriptor};
use crate::notify::{Signal, Subscription};
use crate::status::ModuleInstanceStatusController;
use crate::store::KeyedStateStore;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One live, stateful instantiation of a module descriptor.
///
/// Owns exactly one [`KeyedStateStore`] and one
/// [`ModuleInstanceStatusController`]. Instances never couple to each other
/// directly; all inter-instance effects go through the workbench buses,
/// which refer to instances by id.
pub struct ModuleInstance {
    id: String,
    name: String,
    descriptor: Weak<ModuleDescriptor>,
    store: KeyedStateStore,
    status: ModuleInstanceStatusController,
    import_signal: Signal<ImportState>,
    context: RefCell<Option<Rc<ModuleContext>>>,
}

impl ModuleInstance {
    pub(crate) fn new(descriptor: &Rc<ModuleDescriptor>, ordinal: u32) -> Rc<Self> {
        Rc::new(Self {
            id: format!("{}-{}", descriptor.name(), ordinal),
            name: descriptor.name().to_string(),
            descriptor: Rc::downgrade(descriptor),
            store: KeyedStateStore::new(),
            status: ModuleInstanceStatusController::new(),
            import_signal: Signal::new(),
            context: RefCell::new(None),
        })
    }

    /// Unique instance id, `"<module name>-<ordinal>"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the module this instance belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Import state, delegated to the descriptor.
    pub fn import_state(&self) -> ImportState {
        self.descriptor
            .upgrade()
            .expect("descriptor outlives its instances")
            .import_state()
    }

    /// This instance's own state store.
    pub fn store(&self) -> &KeyedStateStore {
        &self.store
    }

    /// This instance's status controller.
    pub fn status_controller(&self) -> &ModuleInstanceStatusController {
        &self.status
    }

    /// The narrow accessor object handed to this instance's own
    /// view/settings code. Built lazily on first request and memoized.
    pub fn context(self: &Rc<Self>) -> Rc<ModuleContext> {
        if let Some(context) = self.context.borrow().as_ref() {
            return context.clone();
        }
        let context = Rc::new(ModuleContext {
            instance_id: self.id.clone(),
            store: self.store.clone(),
        });
        *self.context.borrow_mut() = Some(context.clone());
        context
    }

    /// Register a callback for import-state changes of this instance's
    /// module.
    pub fn subscribe_to_import_state(
        &self,
        callback: impl Fn(ImportState) + 'static,
    ) -> Subscription {
        self.import_signal.subscribe(move |state| callback(*state))
    }

    /// Called by the descriptor on every import-state transition; fans out
    /// to this instance's local subscribers.
    pub(crate) fn notify_import_state(&self, state: ImportState) {
        self.import_signal.emit(&state);
    }
}

/// Scoped store accessors bound to one instance's own store.
pub struct ModuleContext {
    instance_id: String,
    store: KeyedStateStore,
}

impl ModuleContext {
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.store.has_state(key)
    }

    pub fn state(&self, key: &str) -> Option<Value> {
        self.store.state(key)
    }

    pub fn state_or_init(&self, key: &str, default: Value) -> Value {
        self.store.state_or_init(key, default)
    }

    pub fn set_state(&self, key: &str, value: Value) {
        self.store.set_state(key, value);
    }

    pub fn subscribe(&self, key: &str, callback: impl Fn(&Value) + 'static) -> Subscription {
        self.store.subscribe(key, callback)
    }
}
