#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Coordinator for the dlsim allocation engine
//!
//! The [`Coordinator`] owns the resource pools, the processes, the waiting
//! queue and the Banker matrices. Each request or release is dispatched to
//! the discipline selected by the current [`dlsim_types::Mode`]:
//!
//! - detection: grant on capacity, queue otherwise, search for cycles on demand
//! - prevention: enforce the resource ordering rule before granting
//! - avoidance: commit only grants that keep the system in a safe state
//!
//! After every release the waiting queue is rescanned in FIFO order.

mod autopilot;
mod coordinator;
mod queue;
mod recovery;
mod shared;
mod topology;

pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use queue::{WaitingQueue, WaitingRequest};
pub use shared::SharedCoordinator;
pub use topology::Topology;
