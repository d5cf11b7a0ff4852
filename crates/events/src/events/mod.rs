use serde::{Deserialize, Serialize};

use crate::EventSource;
use dlsim_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod allocation;
pub mod deadlock;
pub mod general;
pub mod mode;
pub mod simulation;

pub use allocation::*;
pub use deadlock::*;
pub use general::*;
pub use mode::*;
pub use simulation::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Request and release traffic
    Allocation(AllocationEvent),

    /// Wait-for graph analysis and recovery
    Deadlock(DeadlockEvent),

    /// Setup and discipline switching
    Mode(ModeEvent),

    /// Observer notifications
    Simulation(SimulationEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Allocation(_) => EventSource::ALLOCATION,
            Self::Deadlock(_) => EventSource::DEADLOCK,
            Self::Mode(_) => EventSource::MODE,
            Self::Simulation(_) => EventSource::SIMULATION,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Allocation(AllocationEvent::Rejected { .. })
            | Self::Deadlock(
                DeadlockEvent::CycleDetected { .. } | DeadlockEvent::VictimTerminated { .. },
            ) => Level::WARN,

            Self::Allocation(
                AllocationEvent::Requested { .. }
                | AllocationEvent::Granted { .. }
                | AllocationEvent::Released { .. },
            )
            | Self::Deadlock(DeadlockEvent::DetectionRun { .. }) => Level::DEBUG,

            Self::Simulation(SimulationEvent::StateChanged { .. }) => Level::TRACE,

            _ => Level::INFO,
        }
    }
}
