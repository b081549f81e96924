mod error;
mod language;
mod miner;
mod scenario;

pub use error::ScenarioError;
pub use language::LanguageFilter;
pub use miner::{MinerConfig, ScenarioMiner};
pub use scenario::{
    CherryPickScenario, FileCommitGramScenario, MergeScenario, ScenarioRecord,
};
