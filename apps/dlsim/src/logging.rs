//! Structured logging integration for events
//!
//! Converts engine events into tracing records with structured fields so
//! that JSON log files can be filtered by process, resource or step.

use dlsim_events::{
    AllocationEvent, AppEvent, DeadlockEvent, EventMessage, GeneralEvent, ModeEvent,
    SimulationEvent,
};
use tracing::{debug, error, info, trace, warn};

/// Log an `AppEvent` at its level with structured fields
#[allow(clippy::too_many_lines)]
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref().unwrap_or("-");

    match &message.event {
        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message, context } => {
                warn!(source, correlation, context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source, correlation, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(source, correlation, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                error!(
                    source,
                    correlation,
                    operation = %operation,
                    code = ?failure.code,
                    hint = ?failure.hint,
                    "{}",
                    failure.message
                );
            }
        },

        AppEvent::Allocation(event) => match event {
            AllocationEvent::Requested {
                process,
                resource,
                units,
            } => {
                debug!(source, correlation, %process, %resource, units, "Request received");
            }
            AllocationEvent::Granted {
                process,
                resource,
                units,
            } => {
                debug!(source, correlation, %process, %resource, units, "Request granted");
            }
            AllocationEvent::Queued {
                process,
                resource,
                units,
                queue_len,
            } => {
                info!(source, correlation, %process, %resource, units, queue_len, "Request queued");
            }
            AllocationEvent::Denied {
                process,
                resource,
                units,
                reason,
            } => {
                info!(source, correlation, %process, %resource, units, %reason, "Request denied");
            }
            AllocationEvent::Rejected { operation, failure } => {
                warn!(
                    source,
                    correlation,
                    operation = %operation,
                    code = ?failure.code,
                    "{}",
                    failure.message
                );
            }
            AllocationEvent::Released {
                process,
                resource,
                requested,
                released,
            } => {
                debug!(
                    source,
                    correlation,
                    %process,
                    %resource,
                    requested = ?requested,
                    released,
                    "Units released"
                );
            }
            AllocationEvent::WaitingGranted {
                process,
                resource,
                units,
            } => {
                info!(source, correlation, %process, %resource, units, "Waiting request granted");
            }
            AllocationEvent::WaitingDropped { process, entries } => {
                info!(source, correlation, %process, entries, "Waiting requests dropped");
            }
        },

        AppEvent::Deadlock(event) => match event {
            DeadlockEvent::DetectionRun {
                edges,
                waiting,
                deadlocked,
            } => {
                debug!(source, correlation, edges, waiting, deadlocked, "Detection run");
            }
            DeadlockEvent::CycleDetected { cycle } => {
                warn!(source, correlation, cycle = ?cycle, "Deadlock cycle detected");
            }
            DeadlockEvent::VictimTerminated {
                victim,
                policy,
                freed,
            } => {
                warn!(source, correlation, %victim, policy = %policy, freed = ?freed, "Victim terminated");
            }
        },

        AppEvent::Mode(event) => match event {
            ModeEvent::Configured {
                processes,
                resources,
                mode,
            } => {
                info!(source, correlation, processes, resources, %mode, "System configured");
            }
            ModeEvent::Switched { from, to } => {
                info!(source, correlation, %from, %to, "Mode switched");
            }
            ModeEvent::BankerReinitialized {
                processes,
                resources,
            } => {
                info!(source, correlation, processes, resources, "Banker matrices rebuilt");
            }
        },

        AppEvent::Simulation(event) => match event {
            SimulationEvent::StateChanged { step } => {
                trace!(source, correlation, step, "State changed");
            }
            SimulationEvent::AutoStep { description } => {
                info!(source, correlation, "{description}");
            }
        },
    }
}
