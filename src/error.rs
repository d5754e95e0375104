//! Error handling for the workbench core.
//!
//! Two classes of failure deliberately do *not* appear here: unknown module
//! lookups panic (registration is a startup contract, not a runtime
//! condition), and module load failures are a terminal
//! [`ImportState::Failed`](crate::registry::ImportState) observed through the
//! normal notification path rather than an error value.

use thiserror::Error;

/// Main error type for workbench core operations.
#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// A channel's generator produced data that violates its declared
    /// definition. This is a contract failure of the publishing module and
    /// must not be swallowed by it.
    #[error("channel '{channel}' record {index}: {detail}")]
    ChannelSchema {
        channel: String,
        index: usize,
        detail: String,
    },

    /// A channel was read in a state that does not support the operation,
    /// e.g. metadata requested before any broadcast happened.
    #[error("channel '{channel}': {detail}")]
    ChannelState { channel: String, detail: String },

    /// Errors related to configuration loading/parsing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for workbench core operations.
pub type Result<T> = std::result::Result<T, WorkbenchError>;
