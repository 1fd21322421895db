//! Engine error types

use thiserror::Error;

/// Errors surfaced by the public orchestrator operations.
///
/// Nothing in the engine is fatal: setup failure leaves any prior
/// configuration untouched, and configuration problems degrade to documented
/// fallbacks with a logged warning instead of an error.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The configured step selection matched no elements.
    #[error("no step elements matched the configured selection")]
    NoStepsFound,
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, SetupError>;
