//! Error taxonomy shared by the mining and replay subsystems.
//!
//! Each variant below corresponds to one class from the error design: a
//! precondition failure during scenario setup, an environment failure from a
//! container-issued command, a configuration failure, a permission
//! rejection, a timeout, or a data-parsing failure. `scenario-sandbox` reuses
//! this enum rather than defining its own, since the taxonomy spans both
//! subsystems.

use thiserror::Error;

/// Unified error taxonomy for mining and scenario replay.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenario setup failed: checkout refused, missing file, unknown
    /// commit. Recoverable by tearing down the scenario and moving on.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A container-issued command (clone, branch switch, status,
    /// evaluation) returned non-zero. Recoverable at repository granularity
    /// via full repository teardown and re-setup.
    #[error("environment error: {0}")]
    Environment(String),

    /// Unsupported scenario type, missing scenario payload, or invalid
    /// language tag. Fatal to the current call.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A command matched the sandbox deny list. Never raised through this
    /// type in practice — `exec` returns this to the agent as a result, not
    /// as an error — but kept in the taxonomy so callers can classify it
    /// uniformly when they choose to.
    #[error("permission denied: {0}")]
    Permission(String),

    /// A command was killed by its `timeout` wrapper. A subtype of
    /// [`ScenarioError::Environment`]; the scenario is scored as failed.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A scenario record or git command's output could not be parsed. Fatal
    /// to the current scenario; the repository proceeds to the next one.
    #[error("data error: {0}")]
    Data(String),
}
