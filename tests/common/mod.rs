//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use modviz_rs::registry::{ImportState, ModuleDescriptor, ModuleRegistry};
use std::time::{Duration, Instant};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Pump the registry until the descriptor reaches `state` or the timeout
/// elapses.
pub fn wait_for_import(registry: &ModuleRegistry, descriptor: &ModuleDescriptor, state: ImportState) {
    let deadline = Instant::now() + test_timeout();
    while descriptor.import_state() != state {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for import state {:?} (currently {:?})",
            state,
            descriptor.import_state()
        );
        registry.poll_imports();
        std::thread::yield_now();
    }
}
