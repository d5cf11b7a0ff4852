#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deadlock detection over a wait-for graph
//!
//! The graph is rebuilt on demand from the waiting queue and the current
//! resource owners; a depth-first search reports the first cycle found and a
//! [`VictimPolicy`] picks the process to terminate.

mod graph;
mod victim;

pub use graph::WaitForGraph;
pub use victim::{policy_for, FirstInCycle, LowestHoldings, VictimPolicy};
