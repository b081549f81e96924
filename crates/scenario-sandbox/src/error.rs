pub use scenario_core::ScenarioError;
