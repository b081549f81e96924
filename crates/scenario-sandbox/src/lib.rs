mod driver;
mod error;
mod runtime;

pub use driver::{
    ContextBundle, RebaseEvaluationMode, ScenarioDriver, ScenarioDriverConfig, ScenarioInput,
    ScenarioStats, Tally, Verdict,
};
pub use error::ScenarioError;
pub use runtime::{ExecOutcome, RuntimeConfig, SandboxRuntime};
