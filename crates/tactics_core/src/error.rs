//! Error types for the battle simulation.

use thiserror::Error;

/// Result type alias defaulting to [`GameError`].
///
/// The error parameter stays overridable so code that glob-imports the
/// prelude can still spell `Result<T, OtherError>`.
pub type Result<T, E = GameError> = std::result::Result<T, E>;

/// Top-level error type for all simulation errors.
///
/// Only loading a level or restoring a snapshot can fail. Runtime
/// conditions (dead targets, empty selections, unreachable destinations)
/// are recovered locally and never surface as errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// The level or map file could not be found.
    #[error("Missing data file: {0}")]
    MissingFile(String),

    /// A record in a level, save, or map file failed to parse.
    #[error("Malformed record at line {line}: {message}")]
    MalformedRecord {
        /// 1-based line number of the offending record.
        line: usize,
        /// Description of what was expected.
        message: String,
    },

    /// A declared entity count did not match the records that followed.
    #[error("Count mismatch for {what}: declared {declared}, found {found}")]
    CountMismatch {
        /// Which roster the count belonged to.
        what: &'static str,
        /// Count declared in the file header.
        declared: usize,
        /// Number of records actually present (or the roster capacity).
        found: usize,
    },

    /// A roster was asked to hold more entities than its fixed capacity.
    #[error("Roster over capacity for {what}: {requested} > {capacity}")]
    RosterFull {
        /// Which roster overflowed.
        what: &'static str,
        /// Number of entities requested.
        requested: usize,
        /// Fixed capacity of the roster.
        capacity: usize,
    },

    /// Loaded data describes an impossible simulation state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),

    /// Binary snapshot encode or decode failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}
