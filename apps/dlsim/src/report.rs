//! Results produced by CLI commands

use dlsim_types::Snapshot;
use serde::Serialize;

/// Final result of a command, rendered as tables or JSON
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandResult {
    Run(RunReport),
    Scenario(ScenarioReport),
    Snapshot(Snapshot),
}

impl CommandResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    /// One line per autopilot step
    pub steps: Vec<String>,
    /// Deadlocks found by detection runs between steps
    pub deadlocks: Vec<String>,
    /// Whether invariants were audited after every step
    pub verified: bool,
    pub snapshot: Snapshot,
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<ScenarioStep>,
    pub snapshot: Snapshot,
}

#[derive(Debug, Serialize)]
pub struct ScenarioStep {
    pub action: String,
    pub result: String,
}

impl ScenarioStep {
    pub fn new(action: impl Into<String>, result: impl ToString) -> Self {
        Self {
            action: action.into(),
            result: result.to_string(),
        }
    }
}
