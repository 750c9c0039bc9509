//! Crate-wide error hierarchy for patch-engine.
//!
//! Goals:
//! - Single root `EngineError` for every fallible stage.
//! - Fail-soft public entry points map any `Err` back to the unmodified input,
//!   so these errors rarely reach callers directly; the `try_*` variants expose them.
//! - Ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type EngineResult<T> = Result<T, EngineError>;

/// Root error type for the patch-engine crate.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Unified diff parsing failure.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration problems (bad env values, inconsistent limits).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A hunk references lines that the supplied file content does not have.
    #[error("hunk out of bounds: {0}")]
    OutOfBounds(String),
}

/// Unified diff parser errors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid hunk header: {0}")]
    InvalidHunkHeader(String),

    #[error("integer overflow in hunk header: {0}")]
    Overflow(String),
}

/// Configuration errors (env parsing and validation).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A number failed to parse.
    #[error("invalid number in {var}: {value:?}")]
    InvalidNumber {
        /// Variable name (e.g., `PATCH_ENGINE_EXTRA_LINES_BEFORE`).
        var: &'static str,
        /// Raw value as read from the environment.
        value: String,
    },

    /// A field was outside of the allowed range.
    #[error("{field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },
}
