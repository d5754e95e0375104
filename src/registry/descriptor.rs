//! Module descriptors and the lazy-import state machine.

use super::instance::ModuleInstance;
use super::ImportOutcome;
use crossbeam_channel::Sender;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Import state of a module descriptor.
///
/// Transitions only ever move forward: `NotImported → Importing →
/// {Imported | Failed}`. A failed module stays failed; there is no automatic
/// retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    NotImported,
    Importing,
    Imported,
    Failed,
}

/// The loading work a module performs before its views can render.
///
/// Runs once, on a background thread, with exactly two terminal outcomes and
/// no cancellation. The `Err` payload is a human-readable reason logged by
/// the registry.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleLoader: Send {
    fn load(&mut self) -> std::result::Result<(), String>;
}

/// Adapter for modules whose loading work is a plain closure.
pub struct FnLoader<F>(pub F);

impl<F> ModuleLoader for FnLoader<F>
where
    F: FnMut() -> std::result::Result<(), String> + Send,
{
    fn load(&mut self) -> std::result::Result<(), String> {
        (self.0)()
    }
}

/// One registered module: the load-once definition of a pluggable unit,
/// independent of any running instance, and the factory for instances.
pub struct ModuleDescriptor {
    id: u64,
    name: String,
    import_state: Cell<ImportState>,
    instances: RefCell<Vec<Rc<ModuleInstance>>>,
    next_ordinal: Cell<u32>,
    loader: RefCell<Option<Box<dyn ModuleLoader>>>,
    outcome_tx: Sender<ImportOutcome>,
}

impl ModuleDescriptor {
    pub(crate) fn new(
        id: u64,
        name: String,
        loader: Box<dyn ModuleLoader>,
        outcome_tx: Sender<ImportOutcome>,
    ) -> Rc<Self> {
        Rc::new(Self {
            id,
            name,
            import_state: Cell::new(ImportState::NotImported),
            instances: RefCell::new(Vec::new()),
            next_ordinal: Cell::new(0),
            loader: RefCell::new(Some(loader)),
            outcome_tx,
        })
    }

    pub(crate) fn descriptor_id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn import_state(&self) -> ImportState {
        self.import_state.get()
    }

    /// Running instances, in creation order.
    pub fn instances(&self) -> Vec<Rc<ModuleInstance>> {
        self.instances.borrow().clone()
    }

    /// Create the next instance of this module and kick off the lazy import.
    ///
    /// Instance ids are `"<name>-<ordinal>"` with a per-descriptor ordinal
    /// starting at 0.
    pub fn make_instance(self: &Rc<Self>) -> Rc<ModuleInstance> {
        let ordinal = self.next_ordinal.get();
        self.next_ordinal.set(ordinal + 1);
        let instance = ModuleInstance::new(self, ordinal);
        self.instances.borrow_mut().push(instance.clone());
        self.maybe_import_self();
        instance
    }

    /// Begin the asynchronous load if it has not begun yet.
    ///
    /// Memoized at the descriptor: any state other than `NotImported` makes
    /// this a no-op, so the load runs exactly once regardless of how many
    /// instances are created.
    fn maybe_import_self(&self) {
        if self.import_state.get() != ImportState::NotImported {
            return;
        }
        self.set_import_state(ImportState::Importing);

        let Some(mut loader) = self.loader.borrow_mut().take() else {
            return;
        };
        let tx = self.outcome_tx.clone();
        let descriptor_id = self.id;
        let name = self.name.clone();
        std::thread::spawn(move || {
            let result = loader.load();
            if tx.send(ImportOutcome { descriptor_id, result }).is_err() {
                tracing::warn!(module = %name, "registry gone before module finished loading");
            }
        });
    }

    /// Apply a transition and notify every existing instance of this
    /// descriptor — not just the one that triggered the import — so all open
    /// instances of a module react together when it finishes (or fails).
    pub(crate) fn set_import_state(&self, state: ImportState) {
        self.import_state.set(state);
        tracing::info!(module = %self.name, ?state, "module import state changed");
        let instances: Vec<Rc<ModuleInstance>> = self.instances.borrow().clone();
        for instance in instances {
            instance.notify_import_state(state);
        }
    }
}
