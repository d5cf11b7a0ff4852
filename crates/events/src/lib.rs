#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for observing the dlsim allocation engine
//!
//! The engine never prints or logs on its own. Every state change is
//! reported as an [`AppEvent`] through an optional channel; the driver
//! decides how to render or log it.
//!
//! ## Architecture
//!
//! - **Domain-driven events**: Events grouped by functional domain (Allocation, Deadlock, ...)
//! - **Unified `EventEmitter` trait**: Single, consistent API for all event emissions
//! - **Metadata envelope**: Every event travels with an [`EventMeta`] for correlation and log routing

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AllocationEvent, AppEvent, DeadlockEvent, FailureContext, GeneralEvent, ModeEvent,
    SimulationEvent,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Event plus the metadata captured when it was emitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event, deriving level and source from the event itself
    #[must_use]
    pub fn from_event(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }
}

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout dlsim
///
/// Implemented for the raw `EventSender` and for any component that
/// optionally holds one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Correlation id attached to every emitted event (e.g. the simulation step)
    fn correlation_id(&self) -> Option<String> {
        None
    }

    /// Labels attached to every emitted event's metadata
    fn event_labels(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let mut message = EventMessage::from_event(event);
            if let Some(correlation) = self.correlation_id() {
                message.meta = message.meta.with_correlation_id(correlation);
            }
            for (key, value) in self.event_labels() {
                message.meta = message.meta.with_label(key, value);
            }
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(message);
        }
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, failure: FailureContext) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure,
        }));
    }

    /// Emit an allocation event
    fn emit_allocation(&self, event: AllocationEvent) {
        self.emit(AppEvent::Allocation(event));
    }

    /// Emit a deadlock event
    fn emit_deadlock(&self, event: DeadlockEvent) {
        self.emit(AppEvent::Deadlock(event));
    }

    /// Emit the observer notification that shared state changed
    fn emit_state_changed(&self, step: u64) {
        self.emit(AppEvent::Simulation(SimulationEvent::StateChanged { step }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
