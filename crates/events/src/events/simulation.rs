use serde::{Deserialize, Serialize};

/// Observer notifications for drivers that render state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    /// Shared state changed; renderers should take a fresh snapshot
    StateChanged { step: u64 },

    /// The scripted driver performed one action
    AutoStep { description: String },
}
