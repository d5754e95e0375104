//! Per-instance status and log aggregation.
//!
//! Each module instance carries a [`ModuleInstanceStatusController`] feeding
//! the diagnostics drawer and the instance header. The controller is
//! transactional: every mutating call writes a **candidate** state that is
//! invisible to subscribers until [`revise_and_publish`][revise] runs, which
//! reconciles hot messages into the log, diffs the candidate against the
//! last **committed** snapshot field by field, commits, and notifies only
//! the fields that actually changed.
//!
//! [revise]: ModuleInstanceStatusController::revise_and_publish

use crate::notify::{Hub, Subscription};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Where inside a module instance a status event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusSource {
    View,
    Settings,
}

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Error,
    Warning,
}

/// One status message, as reported by module instrumentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub source: StatusSource,
    pub message: String,
    pub kind: MessageKind,
    pub timestamp_ms: i64,
}

/// One entry of the instance log. Index 0 is the newest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogEntry {
    Loading,
    LoadingDone,
    Success,
    Message {
        source: StatusSource,
        message: String,
        kind: MessageKind,
        timestamp_ms: i64,
        /// How many consecutive identical messages this entry stands for.
        repetitions: u32,
    },
}

/// The diffable fields of the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusField {
    HotMessages,
    Log,
    Loading,
    DebugMessages,
    RenderCounts,
}

/// Committed-state snapshot value, keyed by [`StatusField`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSnapshot {
    HotMessages(Vec<StatusMessage>),
    Log(Vec<LogEntry>),
    Loading(bool),
    DebugMessages(HashMap<StatusSource, String>),
    RenderCounts(HashMap<StatusSource, u64>),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct StatusState {
    hot_messages: Vec<StatusMessage>,
    log: Vec<LogEntry>,
    loading: bool,
    debug_messages: HashMap<StatusSource, String>,
    render_counts: HashMap<StatusSource, u64>,
}

struct StatusInner {
    candidate: RefCell<StatusState>,
    committed: RefCell<StatusState>,
    hub: Hub<StatusField, ()>,
}

/// Transactional status/log accumulator for one module instance.
///
/// Cloning produces another handle to the same controller.
#[derive(Clone)]
pub struct ModuleInstanceStatusController {
    inner: Rc<StatusInner>,
}

impl Default for ModuleInstanceStatusController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleInstanceStatusController {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StatusInner {
                candidate: RefCell::new(StatusState::default()),
                committed: RefCell::new(StatusState::default()),
                hub: Hub::new(),
            }),
        }
    }

    // --- Mutations (candidate state only) ---

    /// Queue a status message. Visible to subscribers after the next
    /// [`revise_and_publish`][Self::revise_and_publish].
    pub fn add_message(&self, source: StatusSource, message: impl Into<String>, kind: MessageKind) {
        self.inner.candidate.borrow_mut().hot_messages.push(StatusMessage {
            source,
            message: message.into(),
            kind,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
    }

    pub fn clear_hot_messages(&self) {
        self.inner.candidate.borrow_mut().hot_messages.clear();
    }

    /// Mark the instance as loading or finished.
    ///
    /// `true` pushes a `Loading` entry at the log head unless one is
    /// already there. `false` scans from the head and closes the most
    /// recent still-open `Loading` entry with a `LoadingDone` marker.
    pub fn set_loading(&self, loading: bool) {
        let mut candidate = self.inner.candidate.borrow_mut();
        candidate.loading = loading;
        if loading {
            if !matches!(candidate.log.first(), Some(LogEntry::Loading)) {
                candidate.log.insert(0, LogEntry::Loading);
            }
        } else {
            let mut insert_at = None;
            for (i, entry) in candidate.log.iter().enumerate() {
                match entry {
                    LogEntry::LoadingDone => break,
                    LogEntry::Loading => {
                        insert_at = Some(i);
                        break;
                    }
                    _ => {}
                }
            }
            if let Some(i) = insert_at {
                candidate.log.insert(i, LogEntry::LoadingDone);
            }
        }
    }

    pub fn set_debug_message(&self, source: StatusSource, message: impl Into<String>) {
        self.inner
            .candidate
            .borrow_mut()
            .debug_messages
            .insert(source, message.into());
    }

    pub fn increment_render_count(&self, source: StatusSource) {
        *self
            .inner
            .candidate
            .borrow_mut()
            .render_counts
            .entry(source)
            .or_insert(0) += 1;
    }

    // --- Commit ---

    /// Reconcile the candidate state, commit it, and notify subscribers of
    /// the fields that changed.
    ///
    /// Hot messages are only folded into the log while not loading —
    /// messages arriving mid-load are held back rather than interleaved
    /// into the log. A message identical in text and kind to the entry at
    /// the log head increments that entry's `repetitions` counter instead
    /// of duplicating it. A `LoadingDone` marker at the head gets a
    /// `Success` marker inserted in front of it.
    pub fn revise_and_publish(&self) {
        {
            let mut candidate = self.inner.candidate.borrow_mut();
            let StatusState {
                hot_messages, log, loading, ..
            } = &mut *candidate;
            if !*loading {
                for msg in hot_messages.drain(..) {
                    match log.first_mut() {
                        Some(LogEntry::Message {
                            message,
                            kind,
                            repetitions,
                            ..
                        }) if *message == msg.message && *kind == msg.kind => {
                            *repetitions += 1;
                        }
                        _ => log.insert(
                            0,
                            LogEntry::Message {
                                source: msg.source,
                                message: msg.message,
                                kind: msg.kind,
                                timestamp_ms: msg.timestamp_ms,
                                repetitions: 1,
                            },
                        ),
                    }
                }
            }
            if matches!(log.first(), Some(LogEntry::LoadingDone)) {
                log.insert(0, LogEntry::Success);
            }
        }

        let changed: Vec<StatusField> = {
            let candidate = self.inner.candidate.borrow();
            let mut committed = self.inner.committed.borrow_mut();
            let mut changed = Vec::new();
            if candidate.hot_messages != committed.hot_messages {
                changed.push(StatusField::HotMessages);
            }
            if candidate.log != committed.log {
                changed.push(StatusField::Log);
            }
            if candidate.loading != committed.loading {
                changed.push(StatusField::Loading);
            }
            if candidate.debug_messages != committed.debug_messages {
                changed.push(StatusField::DebugMessages);
            }
            if candidate.render_counts != committed.render_counts {
                changed.push(StatusField::RenderCounts);
            }
            *committed = candidate.clone();
            changed
        };

        for field in changed {
            self.inner.hub.notify(&field, &());
        }
    }

    // --- Read side (committed state) ---

    pub fn hot_messages(&self) -> Vec<StatusMessage> {
        self.inner.committed.borrow().hot_messages.clone()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.inner.committed.borrow().log.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.committed.borrow().loading
    }

    pub fn debug_message(&self, source: StatusSource) -> Option<String> {
        self.inner.committed.borrow().debug_messages.get(&source).cloned()
    }

    pub fn render_count(&self, source: StatusSource) -> u64 {
        self.inner
            .committed
            .borrow()
            .render_counts
            .get(&source)
            .copied()
            .unwrap_or(0)
    }

    /// Register a callback for commits that changed `field`; read the new
    /// value through the typed accessors or a snapshot getter.
    pub fn subscribe(&self, field: StatusField, callback: impl Fn() + 'static) -> Subscription {
        self.inner.hub.subscribe(field, move |_| callback())
    }

    /// Snapshot getter for one field of the committed state, the read half
    /// of the reactive-read pair.
    pub fn make_snapshot_getter(&self, field: StatusField) -> impl Fn() -> StatusSnapshot {
        let controller = self.clone();
        move || {
            let committed = controller.inner.committed.borrow();
            match field {
                StatusField::HotMessages => StatusSnapshot::HotMessages(committed.hot_messages.clone()),
                StatusField::Log => StatusSnapshot::Log(committed.log.clone()),
                StatusField::Loading => StatusSnapshot::Loading(committed.loading),
                StatusField::DebugMessages => {
                    StatusSnapshot::DebugMessages(committed.debug_messages.clone())
                }
                StatusField::RenderCounts => {
                    StatusSnapshot::RenderCounts(committed.render_counts.clone())
                }
            }
        }
    }
}
