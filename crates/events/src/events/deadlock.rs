use dlsim_types::{ProcessId, ResourceId};
use serde::{Deserialize, Serialize};

/// Wait-for graph analysis and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeadlockEvent {
    /// A detection pass finished
    DetectionRun {
        edges: usize,
        waiting: usize,
        deadlocked: bool,
    },

    /// A cycle was found in the wait-for graph
    CycleDetected { cycle: Vec<ProcessId> },

    /// The victim was terminated and its holdings returned to the pools
    VictimTerminated {
        victim: ProcessId,
        policy: String,
        freed: Vec<(ResourceId, u32)>,
    },
}
