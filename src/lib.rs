//! # ModViz-RS: module workbench core
//!
//! The module lifecycle and inter-module communication engine of a
//! plugin-style data visualization workbench. Independently loaded modules
//! (visualization/analysis units) run side by side and exchange state
//! without being statically linked to each other; this crate is the part
//! that makes that possible. It renders nothing and fetches nothing — the
//! UI layer and data clients are consumers of these APIs.
//!
//! ## Architecture
//!
//! - **Registry**: module descriptors with a lazy-import state machine;
//!   descriptors produce instances, each owning a private keyed state store
//!   and a status controller
//! - **Buses**: a global topic bus ([`workbench::WorkbenchServices`]), typed
//!   lazily-computed data channels ([`broadcast::Broadcaster`]), and
//!   dual-rate hover synchronization ([`hover::HoverService`])
//! - **One primitive underneath**: every reactive surface is built on the
//!   same subscribe/notify hub ([`notify`]) — synchronous fan-out in
//!   subscription order, single-threaded by construction
//!
//! The host pumps the event loop: module loads run on background threads
//! and hover throttle windows elapse over time, but both re-enter through
//! [`workbench::Workbench::tick`], so every subscriber callback runs on the
//! host thread.
//!
//! ## Example
//!
//! ```ignore
//! use modviz_rs::config::WorkbenchConfig;
//! use modviz_rs::registry::FnLoader;
//! use modviz_rs::workbench::Workbench;
//!
//! let workbench = Workbench::new(WorkbenchConfig::default());
//!
//! // Startup: register the application's modules.
//! let map = workbench
//!     .registry()
//!     .register_module("map", Box::new(FnLoader(|| Ok(()))));
//!
//! // A module is imported lazily when its first instance appears.
//! let instance = map.make_instance();
//! let _sub = instance.subscribe_to_import_state(|state| {
//!     println!("map import state: {state:?}");
//! });
//!
//! // Host frame loop.
//! loop {
//!     workbench.tick();
//!     # break;
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod error;
pub mod hover;
pub mod notify;
pub mod registry;
pub mod status;
pub mod store;
pub mod workbench;

// Re-export commonly used types
pub use broadcast::{BroadcastChannel, Broadcaster, ChannelDef, ChannelKeyKind, ChannelValueKind};
pub use config::{HoverConfig, WorkbenchConfig};
pub use error::{Result, WorkbenchError};
pub use hover::HoverService;
pub use registry::{FnLoader, ImportState, ModuleInstance, ModuleLoader, ModuleRegistry};
pub use status::ModuleInstanceStatusController;
pub use store::KeyedStateStore;
pub use workbench::{Workbench, WorkbenchServices};
