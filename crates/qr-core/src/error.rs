//! Base error type shared by the `qr-*` crates.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::NodeId;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The run cannot start or continue with the given setup (bad config
    /// values, a routing node without links, …).
    #[error("configuration error: {0}")]
    Config(String),

    /// A programming defect: state that correct wiring never produces.
    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `qr-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
