use dlsim_types::{DenialReason, ProcessId, ResourceId};
use serde::{Deserialize, Serialize};

/// Request/release traffic through the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationEvent {
    /// A well-formed request reached the active discipline
    Requested {
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    },

    /// Units moved from the pool to the process
    Granted {
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    },

    /// Capacity unavailable; request appended to the waiting queue
    Queued {
        process: ProcessId,
        resource: ResourceId,
        units: u32,
        queue_len: usize,
    },

    /// Refused by the active discipline
    Denied {
        process: ProcessId,
        resource: ResourceId,
        units: u32,
        reason: DenialReason,
    },

    /// Usage error; nothing was mutated
    Rejected {
        operation: String,
        failure: super::FailureContext,
    },

    /// Units returned to the pool
    Released {
        process: ProcessId,
        resource: ResourceId,
        requested: Option<u32>,
        released: u32,
    },

    /// A queued request became satisfiable and was granted during a rescan
    WaitingGranted {
        process: ProcessId,
        resource: ResourceId,
        units: u32,
    },

    /// Queued requests discarded because their owner was terminated
    WaitingDropped { process: ProcessId, entries: usize },
}
