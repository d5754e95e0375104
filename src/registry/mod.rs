//! Module registry and lifecycle.
//!
//! The registry is the process-wide table of module descriptors, constructed
//! once at startup and dependency-injected into everything that resolves
//! modules — there is no ambient global state. Descriptors are registered at
//! startup, never removed, and act as factories for running instances.
//!
//! # Lazy imports
//!
//! A module's loading work (its [`ModuleLoader`]) does not run at
//! registration. The first instance created for a descriptor transitions the
//! descriptor `NotImported → Importing` and spawns the load on a background
//! thread; the terminal outcome (`Imported` or `Failed`) travels back over a
//! crossbeam channel and is applied by [`ModuleRegistry::poll_imports`] on
//! the host thread. All subscriber fan-out therefore happens on the calling
//! turn of the host's event loop.

mod descriptor;
mod instance;

pub use descriptor::{FnLoader, ImportState, ModuleDescriptor, ModuleLoader};
pub use instance::{ModuleContext, ModuleInstance};

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::RefCell;
use std::rc::Rc;

/// Terminal outcome of one module load, reported by the load thread.
pub(crate) struct ImportOutcome {
    pub descriptor_id: u64,
    pub result: std::result::Result<(), String>,
}

/// Process-wide table of module descriptors.
pub struct ModuleRegistry {
    modules: RefCell<Vec<Rc<ModuleDescriptor>>>,
    next_descriptor_id: std::cell::Cell<u64>,
    outcome_tx: Sender<ImportOutcome>,
    outcome_rx: Receiver<ImportOutcome>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        let (outcome_tx, outcome_rx) = unbounded();
        Self {
            modules: RefCell::new(Vec::new()),
            next_descriptor_id: std::cell::Cell::new(0),
            outcome_tx,
            outcome_rx,
        }
    }

    /// Register a module under `name` with the loader that will run on first
    /// instantiation.
    ///
    /// There is no duplicate detection: registering a name twice shadows the
    /// earlier descriptor on lookup. Callers are expected to register each
    /// name once at startup.
    pub fn register_module(
        &self,
        name: impl Into<String>,
        loader: Box<dyn ModuleLoader>,
    ) -> Rc<ModuleDescriptor> {
        let id = self.next_descriptor_id.get();
        self.next_descriptor_id.set(id + 1);
        let descriptor = ModuleDescriptor::new(id, name.into(), loader, self.outcome_tx.clone());
        tracing::debug!(module = %descriptor.name(), "registered module");
        self.modules.borrow_mut().push(descriptor.clone());
        descriptor
    }

    /// Look up a registered module by name.
    ///
    /// # Panics
    ///
    /// Panics if no module with that name was registered. Registration is a
    /// startup contract; an unknown name is a programmer mistake, not a
    /// recoverable condition.
    pub fn module(&self, name: &str) -> Rc<ModuleDescriptor> {
        self.modules
            .borrow()
            .iter()
            .rev()
            .find(|d| d.name() == name)
            .cloned()
            .unwrap_or_else(|| panic!("module '{}' is not registered", name))
    }

    /// Names of all registered modules, in registration order.
    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .borrow()
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Drain finished module loads and apply their terminal transitions.
    ///
    /// Called by the host once per event-loop turn; every import-state
    /// notification fans out inline from here.
    pub fn poll_imports(&self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            let descriptor = self
                .modules
                .borrow()
                .iter()
                .find(|d| d.descriptor_id() == outcome.descriptor_id)
                .cloned();
            let Some(descriptor) = descriptor else {
                continue;
            };
            match outcome.result {
                Ok(()) => descriptor.set_import_state(ImportState::Imported),
                Err(reason) => {
                    tracing::warn!(module = %descriptor.name(), %reason, "module import failed");
                    descriptor.set_import_state(ImportState::Failed);
                }
            }
        }
    }
}
