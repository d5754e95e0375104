//! Integration tests for the transactional status controller.

mod common;

use modviz_rs::status::{
    LogEntry, MessageKind, ModuleInstanceStatusController, StatusField, StatusSource,
};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_duplicate_messages_become_one_entry_with_repetitions() {
    let status = ModuleInstanceStatusController::new();
    status.add_message(StatusSource::View, "no realizations selected", MessageKind::Warning);
    status.add_message(StatusSource::View, "no realizations selected", MessageKind::Warning);
    status.revise_and_publish();

    let log = status.log();
    assert_eq!(log.len(), 1);
    match &log[0] {
        LogEntry::Message {
            message,
            kind,
            repetitions,
            ..
        } => {
            assert_eq!(message, "no realizations selected");
            assert_eq!(*kind, MessageKind::Warning);
            assert_eq!(*repetitions, 2);
        }
        other => panic!("expected a message entry, got {:?}", other),
    }
}

#[test]
fn test_revision_without_mutation_is_silent() {
    let status = ModuleInstanceStatusController::new();
    status.add_message(StatusSource::Settings, "x", MessageKind::Error);

    let notifications = Rc::new(RefCell::new(0));
    let n = notifications.clone();
    let _log_sub = status.subscribe(StatusField::Log, move || *n.borrow_mut() += 1);
    let n = notifications.clone();
    let _hot_sub = status.subscribe(StatusField::HotMessages, move || *n.borrow_mut() += 1);

    status.revise_and_publish();
    let after_first = *notifications.borrow();
    assert!(after_first > 0);

    // No intervening mutation: the diff is empty, nobody hears anything.
    status.revise_and_publish();
    assert_eq!(*notifications.borrow(), after_first);
}

#[test]
fn test_loading_cycle_end_to_end() {
    let status = ModuleInstanceStatusController::new();
    status.set_loading(true);
    status.set_loading(false);
    status.revise_and_publish();

    assert_eq!(
        status.log(),
        vec![LogEntry::Success, LogEntry::LoadingDone, LogEntry::Loading]
    );
    assert!(!status.loading());
}

#[test]
fn test_messages_during_load_wait_for_completion() {
    let status = ModuleInstanceStatusController::new();
    status.set_loading(true);
    status.add_message(StatusSource::View, "slow response", MessageKind::Warning);
    status.revise_and_publish();

    assert!(status
        .log()
        .iter()
        .all(|e| !matches!(e, LogEntry::Message { .. })));

    status.set_loading(false);
    status.revise_and_publish();

    let log = status.log();
    assert!(log.iter().any(|e| matches!(e, LogEntry::Message { .. })));
}

#[test]
fn test_render_counts_accumulate_per_source() {
    let status = ModuleInstanceStatusController::new();
    status.increment_render_count(StatusSource::View);
    status.increment_render_count(StatusSource::View);
    status.increment_render_count(StatusSource::Settings);
    status.revise_and_publish();

    assert_eq!(status.render_count(StatusSource::View), 2);
    assert_eq!(status.render_count(StatusSource::Settings), 1);
}

#[test]
fn test_clear_hot_messages_discards_pending() {
    let status = ModuleInstanceStatusController::new();
    status.add_message(StatusSource::View, "transient", MessageKind::Warning);
    status.clear_hot_messages();
    status.revise_and_publish();

    assert!(status.log().is_empty());
    assert!(status.hot_messages().is_empty());
}

#[test]
fn test_controller_is_attached_to_each_instance() {
    use modviz_rs::registry::{FnLoader, ModuleRegistry};

    let registry = ModuleRegistry::new();
    let descriptor = registry.register_module("map", Box::new(FnLoader(|| Ok(()))));
    let a = descriptor.make_instance();
    let b = descriptor.make_instance();

    a.status_controller()
        .add_message(StatusSource::View, "only on a", MessageKind::Error);
    a.status_controller().revise_and_publish();
    b.status_controller().revise_and_publish();

    assert_eq!(a.status_controller().log().len(), 1);
    assert!(b.status_controller().log().is_empty());
}
